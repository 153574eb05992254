//! Adjudication lookup: role name → decision, used for badge decoration.
//!
//! Decisions live in two places. The remote copy is loaded through a
//! one-shot [`RemoteCache`]; the local copy is the set of status edits whose
//! writes are still in flight. Reads overlay local on remote. Once a write
//! settles its local entry is dropped, so after the refetch the badge shows
//! whatever the server holds, including after a failed write.

use std::collections::HashMap;
use std::sync::Arc;

use aegis_core::AdjudicationStatus;
use aegis_sync::{CachePolicy, RemoteCache, ReviewBackend};

use crate::pending::PendingEdits;

pub type DecisionMap = HashMap<String, AdjudicationStatus>;

#[derive(Clone)]
pub struct AdjudicationLookup {
    remote: RemoteCache<DecisionMap>,
    pending: PendingEdits,
}

impl AdjudicationLookup {
    pub fn new(backend: Arc<dyn ReviewBackend>) -> Self {
        let remote = RemoteCache::new("adjudication-lookup", CachePolicy::OneShot, move || {
            let backend = Arc::clone(&backend);
            async move {
                let decisions = backend.fetch_decisions().await?;
                Ok(decisions
                    .into_iter()
                    .map(|d| (d.role_name, d.status))
                    .collect::<DecisionMap>())
            }
        });
        Self {
            remote,
            pending: PendingEdits::default(),
        }
    }

    /// Unsettled edits of this session, shared with the dispatcher.
    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    /// Remote decisions (loaded if needed) with unsettled changes on top.
    pub async fn snapshot(&self) -> DecisionMap {
        let mut map = self.remote.ensure_loaded(false).await.unwrap_or_default();
        map.extend(self.pending.statuses());
        map
    }

    pub async fn status_of(&self, role_name: &str) -> Option<AdjudicationStatus> {
        self.snapshot().await.get(role_name).copied()
    }

    /// Drop the remote copy so the next read refetches it.
    pub async fn invalidate(&self) {
        self.remote.invalidate().await;
    }

    pub async fn dispose(&self) {
        self.remote.dispose().await;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use crate::pending::Edit;
    use aegis_core::Decision;

    #[tokio::test]
    async fn local_overlays_remote() {
        let backend = MockBackend::default();
        backend.set_decisions(vec![
            Decision::new("PM", AdjudicationStatus::Confirmed),
            Decision::new("QA", AdjudicationStatus::Rejected),
        ]);
        let lookup = AdjudicationLookup::new(Arc::new(backend.clone()));
        lookup
            .pending()
            .record("QA", Edit::Status(AdjudicationStatus::Deliverable));

        let snap = lookup.snapshot().await;
        assert_eq!(snap.get("PM"), Some(&AdjudicationStatus::Confirmed));
        assert_eq!(snap.get("QA"), Some(&AdjudicationStatus::Deliverable));
        assert_eq!(lookup.status_of("nobody").await, None);
        assert_eq!(backend.calls("fetch_decisions"), 1);
    }

    #[tokio::test]
    async fn invalidate_refetches_remote() {
        let backend = MockBackend::default();
        let lookup = AdjudicationLookup::new(Arc::new(backend.clone()));
        lookup.snapshot().await;
        lookup.snapshot().await;
        assert_eq!(backend.calls("fetch_decisions"), 1);
        lookup.invalidate().await;
        lookup.snapshot().await;
        assert_eq!(backend.calls("fetch_decisions"), 2);
    }

    #[tokio::test]
    async fn settled_edit_gives_way_to_server() {
        let backend = MockBackend::default();
        let lookup = AdjudicationLookup::new(Arc::new(backend.clone()));
        let ticket = lookup
            .pending()
            .record("PM", Edit::Status(AdjudicationStatus::Confirmed));
        assert_eq!(lookup.status_of("PM").await, Some(AdjudicationStatus::Confirmed));

        lookup.pending().settle(&[ticket]);
        lookup.invalidate().await;
        assert_eq!(lookup.status_of("PM").await, None);
    }
}
