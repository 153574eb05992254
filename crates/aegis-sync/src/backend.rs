//! The backend seam: every remote operation the review client performs.

use aegis_core::{Decision, ReviewStats, Role, RoleDocumentMatrix, ScanHistoryEntry};
use async_trait::async_trait;
use serde::Deserialize;

use crate::SyncError;

/// Standard response wrapper: `{"success": bool, "data": ..., "error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into [`SyncError::Backend`].
    pub fn into_data(self) -> Result<T, SyncError> {
        if !self.success {
            return Err(SyncError::Backend(
                self.error.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data.ok_or(SyncError::MissingData)
    }

    /// For writes whose payload is irrelevant.
    pub fn into_ack(self) -> Result<(), SyncError> {
        if self.success {
            Ok(())
        } else {
            Err(SyncError::Backend(
                self.error.unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }
}

/// Server-rendered board export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardFormat {
    Html,
    Pdf,
}

impl BoardFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for BoardFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown board format: {other}")),
        }
    }
}

/// Remote operations backing the review UI.
///
/// [`HttpBackend`](crate::HttpBackend) talks to the real server; tests
/// supply in-memory implementations.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Roles aggregated across all scanned documents.
    async fn fetch_roles(&self) -> Result<Vec<Role>, SyncError>;

    /// Manually curated dictionary roles.
    async fn fetch_dictionary(&self) -> Result<Vec<Role>, SyncError>;

    async fn fetch_role_documents(&self) -> Result<RoleDocumentMatrix, SyncError>;

    async fn fetch_scan_history(&self) -> Result<Vec<ScanHistoryEntry>, SyncError>;

    async fn fetch_review_stats(&self) -> Result<ReviewStats, SyncError>;

    /// Every persisted adjudication decision.
    async fn fetch_decisions(&self) -> Result<Vec<Decision>, SyncError>;

    async fn adjudicate(&self, decision: &Decision) -> Result<(), SyncError>;

    /// Persist several decisions in one request. Returns the number applied.
    async fn adjudicate_batch(&self, decisions: &[Decision]) -> Result<usize, SyncError>;

    async fn assign_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError>;

    async fn remove_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError>;

    /// Download a server-generated board export.
    async fn export_board(&self, format: BoardFormat) -> Result<Vec<u8>, SyncError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success() {
        let env: Envelope<Vec<Role>> =
            serde_json::from_str(r#"{"success": true, "data": [{"role_name": "PM"}]}"#).unwrap();
        let roles = env.into_data().unwrap();
        assert_eq!(roles[0].name, "PM");
    }

    #[test]
    fn envelope_logical_failure() {
        let env: Envelope<Vec<Role>> =
            serde_json::from_str(r#"{"success": false, "error": "database locked"}"#).unwrap();
        let err = env.into_data().unwrap_err();
        assert!(err.is_user_facing());
        assert_eq!(err.to_string(), "database locked");
    }

    #[test]
    fn envelope_missing_success_is_failure() {
        let env: Envelope<ReviewStats> = serde_json::from_str(r#"{"data": {"total": 3}}"#).unwrap();
        assert!(env.into_data().is_err());
    }

    #[test]
    fn envelope_success_without_data() {
        let env: Envelope<ReviewStats> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(SyncError::MissingData)));
        let ack: Envelope<serde_json::Value> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ack.into_ack().is_ok());
    }

    #[test]
    fn board_format_parse() {
        assert_eq!("PDF".parse::<BoardFormat>().unwrap(), BoardFormat::Pdf);
        assert!("docx".parse::<BoardFormat>().is_err());
    }
}
