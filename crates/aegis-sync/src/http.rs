//! HTTP backend client for the AEGIS review API.

use std::sync::Arc;
use std::time::Duration;

use aegis_core::{AegisConfig, Decision, ReviewStats, Role, RoleDocumentMatrix, ScanHistoryEntry};
use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::csrf::{REQUEST_HEADER, RESPONSE_HEADER};
use crate::{BoardFormat, CsrfTokens, Envelope, ReviewBackend, SyncError};

/// JSON-over-HTTP implementation of [`ReviewBackend`].
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    csrf: Arc<CsrfTokens>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    decisions: &'a [Decision],
}

#[derive(Serialize)]
struct TagRequest<'a> {
    role_name: &'a str,
    function_code: &'a str,
}

#[derive(Deserialize)]
struct BatchResult {
    #[serde(default)]
    applied: Option<usize>,
}

impl HttpBackend {
    /// Create a client for the given base URL, e.g. `http://localhost:5050`
    /// (a trailing slash is dropped).
    pub fn new(
        base_url: &str,
        csrf: Arc<CsrfTokens>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf,
        })
    }

    pub fn from_config(config: &AegisConfig) -> Result<Self, SyncError> {
        let csrf = Arc::new(CsrfTokens::from_meta(config.csrf_token.clone()));
        Self::new(&config.base_url, csrf, config.request_timeout())
    }

    pub fn csrf(&self) -> &Arc<CsrfTokens> {
        &self.csrf
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        let envelope: Envelope<T> = self.read_envelope(resp).await?;
        envelope.into_data()
    }

    /// Send a mutating request with the current CSRF token attached.
    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Envelope<T>, SyncError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, method = %method, "sending");
        let mut req = self.client.request(method, &url).json(body);
        if let Some(token) = self.csrf.current() {
            req = req.header(REQUEST_HEADER, token);
        }
        let resp = req.send().await?;
        self.read_envelope(resp).await
    }

    /// Sync any refreshed CSRF token, then decode the envelope.
    ///
    /// Error statuses whose body is itself an envelope with an `error`
    /// message surface as [`SyncError::Backend`].
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        resp: Response,
    ) -> Result<Envelope<T>, SyncError> {
        self.sync_csrf(&resp);
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if let Ok(Envelope {
                error: Some(message),
                ..
            }) = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            {
                return Err(SyncError::Backend(message));
            }
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn sync_csrf(&self, resp: &Response) {
        if let Some(token) = resp
            .headers()
            .get(RESPONSE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.csrf.sync(token);
        }
    }
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn fetch_roles(&self) -> Result<Vec<Role>, SyncError> {
        let roles: Vec<Role> = self.get("/api/roles/aggregated").await?;
        info!(count = roles.len(), "fetched aggregated roles");
        Ok(roles)
    }

    async fn fetch_dictionary(&self) -> Result<Vec<Role>, SyncError> {
        let roles: Vec<Role> = self.get("/api/roles/dictionary").await?;
        info!(count = roles.len(), "fetched dictionary roles");
        Ok(roles)
    }

    async fn fetch_role_documents(&self) -> Result<RoleDocumentMatrix, SyncError> {
        self.get("/api/roles/matrix").await
    }

    async fn fetch_scan_history(&self) -> Result<Vec<ScanHistoryEntry>, SyncError> {
        let history: Vec<ScanHistoryEntry> = self.get("/api/scan-history").await?;
        info!(count = history.len(), "fetched scan history");
        Ok(history)
    }

    async fn fetch_review_stats(&self) -> Result<ReviewStats, SyncError> {
        self.get("/api/roles/adjudication/stats").await
    }

    async fn fetch_decisions(&self) -> Result<Vec<Decision>, SyncError> {
        self.get("/api/roles/adjudication").await
    }

    async fn adjudicate(&self, decision: &Decision) -> Result<(), SyncError> {
        info!(role = %decision.role_name, status = %decision.status, "adjudicating role");
        self.send::<_, serde_json::Value>(Method::POST, "/api/roles/adjudicate", decision)
            .await?
            .into_ack()
    }

    async fn adjudicate_batch(&self, decisions: &[Decision]) -> Result<usize, SyncError> {
        info!(count = decisions.len(), "adjudicating batch");
        let envelope: Envelope<BatchResult> = self
            .send(
                Method::POST,
                "/api/roles/adjudicate/batch",
                &BatchRequest { decisions },
            )
            .await?;
        if !envelope.success {
            return envelope.into_ack().map(|()| 0);
        }
        let applied = envelope
            .data
            .and_then(|d| d.applied)
            .unwrap_or(decisions.len());
        info!(applied, "batch adjudication complete");
        Ok(applied)
    }

    async fn assign_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError> {
        let body = TagRequest {
            role_name,
            function_code: code,
        };
        self.send::<_, serde_json::Value>(Method::POST, "/api/roles/tags", &body)
            .await?
            .into_ack()
    }

    async fn remove_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError> {
        let body = TagRequest {
            role_name,
            function_code: code,
        };
        self.send::<_, serde_json::Value>(Method::DELETE, "/api/roles/tags", &body)
            .await?
            .into_ack()
    }

    async fn export_board(&self, format: BoardFormat) -> Result<Vec<u8>, SyncError> {
        let url = self.url(&format!("/api/roles/export/board?format={}", format.as_str()));
        info!(url = %url, "downloading board export");
        let resp = self.client.get(&url).send().await?;
        self.sync_csrf(&resp);
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
