//! The remote caches owned by one review context.

use std::sync::Arc;
use std::time::Duration;

use aegis_core::{ReviewStats, Role, RoleDocumentMatrix, ScanHistoryEntry};
use aegis_sync::{CachePolicy, RemoteCache, ReviewBackend};
use tracing::debug;

use crate::AdjudicationLookup;

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ReviewCaches {
    pub roles: RemoteCache<Vec<Role>>,
    pub dictionary: RemoteCache<Vec<Role>>,
    pub matrix: RemoteCache<RoleDocumentMatrix>,
    pub scan_history: RemoteCache<Vec<ScanHistoryEntry>>,
    pub stats: RemoteCache<ReviewStats>,
    pub lookup: AdjudicationLookup,
}

/// Build a cache whose loader calls one backend method.
macro_rules! backend_cache {
    ($backend:expr, $name:literal, $policy:expr, $method:ident) => {{
        let backend = Arc::clone(&$backend);
        RemoteCache::new($name, $policy, move || {
            let backend = Arc::clone(&backend);
            async move { backend.$method().await }
        })
    }};
}

impl ReviewCaches {
    pub fn new(backend: Arc<dyn ReviewBackend>, stats_ttl: Duration) -> Self {
        Self {
            roles: backend_cache!(backend, "roles", CachePolicy::OneShot, fetch_roles),
            dictionary: backend_cache!(backend, "dictionary", CachePolicy::OneShot, fetch_dictionary),
            matrix: backend_cache!(backend, "role-matrix", CachePolicy::OneShot, fetch_role_documents),
            scan_history: backend_cache!(backend, "scan-history", CachePolicy::OneShot, fetch_scan_history),
            stats: backend_cache!(backend, "review-stats", CachePolicy::Ttl(stats_ttl), fetch_review_stats),
            lookup: AdjudicationLookup::new(backend),
        }
    }

    /// Drop everything a write can make stale: stats, badges, role lists.
    pub async fn invalidate_after_write(&self) {
        self.stats.invalidate().await;
        self.lookup.invalidate().await;
        self.roles.invalidate().await;
        self.dictionary.invalidate().await;
        debug!("caches invalidated after write");
    }

    pub async fn dispose(&self) {
        self.roles.dispose().await;
        self.dictionary.dispose().await;
        self.matrix.dispose().await;
        self.scan_history.dispose().await;
        self.stats.dispose().await;
        self.lookup.dispose().await;
    }
}
