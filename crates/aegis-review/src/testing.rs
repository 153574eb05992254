//! In-memory backend for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aegis_core::{Decision, ReviewStats, Role, RoleDocumentMatrix, ScanHistoryEntry};
use aegis_sync::{BoardFormat, ReviewBackend, SyncError};
use async_trait::async_trait;

#[derive(Default)]
struct State {
    roles: Vec<Role>,
    decisions: Vec<Decision>,
    history: Vec<ScanHistoryEntry>,
    matrix: RoleDocumentMatrix,
    stats: ReviewStats,
    calls: HashMap<&'static str, usize>,
    batches: Vec<Vec<Decision>>,
    singles: Vec<Decision>,
    tag_ops: Vec<(String, String, bool)>,
    /// `Some(true)`: writes answer `success: false`. `Some(false)`: transport error.
    fail_writes: Option<bool>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub(crate) fn with_roles(roles: Vec<Role>) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().roles = roles;
        backend
    }

    pub(crate) fn set_decisions(&self, decisions: Vec<Decision>) {
        self.state.lock().unwrap().decisions = decisions;
    }

    pub(crate) fn set_history(&self, history: Vec<ScanHistoryEntry>) {
        self.state.lock().unwrap().history = history;
    }

    pub(crate) fn set_matrix(&self, matrix: RoleDocumentMatrix) {
        self.state.lock().unwrap().matrix = matrix;
    }

    pub(crate) fn set_stats(&self, stats: ReviewStats) {
        self.state.lock().unwrap().stats = stats;
    }

    pub(crate) fn fail_writes_logically(&self) {
        self.state.lock().unwrap().fail_writes = Some(true);
    }

    pub(crate) fn fail_writes_in_transport(&self) {
        self.state.lock().unwrap().fail_writes = Some(false);
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    pub(crate) fn batches(&self) -> Vec<Vec<Decision>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub(crate) fn singles(&self) -> Vec<Decision> {
        self.state.lock().unwrap().singles.clone()
    }

    pub(crate) fn tag_ops(&self) -> Vec<(String, String, bool)> {
        self.state.lock().unwrap().tag_ops.clone()
    }

    fn hit(&self, op: &'static str) {
        *self.state.lock().unwrap().calls.entry(op).or_default() += 1;
    }

    /// Make accepted decisions visible to later fetches.
    fn store(&self, decisions: &[Decision]) {
        let mut state = self.state.lock().unwrap();
        for decision in decisions {
            state.decisions.retain(|d| d.role_name != decision.role_name);
            state.decisions.push(decision.clone());
            if let Some(role) = state.roles.iter_mut().find(|r| r.name == decision.role_name) {
                role.status = decision.status;
            }
        }
    }

    fn write_result(&self) -> Result<(), SyncError> {
        match self.state.lock().unwrap().fail_writes {
            Some(true) => Err(SyncError::Backend("role is locked".into())),
            Some(false) => Err(SyncError::Server {
                status: 502,
                body: "bad gateway".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReviewBackend for MockBackend {
    async fn fetch_roles(&self) -> Result<Vec<Role>, SyncError> {
        self.hit("fetch_roles");
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn fetch_dictionary(&self) -> Result<Vec<Role>, SyncError> {
        self.hit("fetch_dictionary");
        Ok(Vec::new())
    }

    async fn fetch_role_documents(&self) -> Result<RoleDocumentMatrix, SyncError> {
        self.hit("fetch_role_documents");
        Ok(self.state.lock().unwrap().matrix.clone())
    }

    async fn fetch_scan_history(&self) -> Result<Vec<ScanHistoryEntry>, SyncError> {
        self.hit("fetch_scan_history");
        Ok(self.state.lock().unwrap().history.clone())
    }

    async fn fetch_review_stats(&self) -> Result<ReviewStats, SyncError> {
        self.hit("fetch_review_stats");
        Ok(self.state.lock().unwrap().stats)
    }

    async fn fetch_decisions(&self) -> Result<Vec<Decision>, SyncError> {
        self.hit("fetch_decisions");
        Ok(self.state.lock().unwrap().decisions.clone())
    }

    async fn adjudicate(&self, decision: &Decision) -> Result<(), SyncError> {
        self.hit("adjudicate");
        self.state.lock().unwrap().singles.push(decision.clone());
        self.write_result()?;
        self.store(std::slice::from_ref(decision));
        Ok(())
    }

    async fn adjudicate_batch(&self, decisions: &[Decision]) -> Result<usize, SyncError> {
        self.hit("adjudicate_batch");
        self.state.lock().unwrap().batches.push(decisions.to_vec());
        self.write_result()?;
        self.store(decisions);
        Ok(decisions.len())
    }

    async fn assign_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError> {
        self.hit("assign_tag");
        self.state
            .lock()
            .unwrap()
            .tag_ops
            .push((role_name.to_string(), code.to_string(), true));
        self.write_result()
    }

    async fn remove_tag(&self, role_name: &str, code: &str) -> Result<(), SyncError> {
        self.hit("remove_tag");
        self.state
            .lock()
            .unwrap()
            .tag_ops
            .push((role_name.to_string(), code.to_string(), false));
        self.write_result()
    }

    async fn export_board(&self, format: BoardFormat) -> Result<Vec<u8>, SyncError> {
        self.hit("export_board");
        Ok(format.as_str().as_bytes().to_vec())
    }
}
