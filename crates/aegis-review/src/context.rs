//! Review context: the explicit owner of every cache, the dispatcher, and
//! filter state for one review session.
//!
//! Lifecycle is `ReviewContext::create(config, backend)` followed by
//! [`dispose`](ReviewContext::dispose). Nothing is process-global, so two
//! contexts never share caches or history.

use std::sync::Arc;

use aegis_core::{
    Action, AegisConfig, FacetOptions, FilterCriteria, ReviewStats, Role, ScanHistoryEntry,
    apply_filters, facet_options,
};
use aegis_sync::{BoardFormat, ReviewBackend, SyncError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::lookup::DecisionMap;
use crate::notice::{Notice, Notifier};
use crate::{ActionDispatcher, ReviewCaches};

const MAX_LOAD_ATTEMPTS: u32 = 3;

/// Which role collection the session reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleSource {
    /// Roles aggregated from scanned documents.
    #[default]
    Aggregated,
    /// The curated role dictionary.
    Dictionary,
}

pub struct ReviewContext {
    config: AegisConfig,
    backend: Arc<dyn ReviewBackend>,
    caches: ReviewCaches,
    dispatcher: ActionDispatcher,
    notifier: Notifier,
    criteria: FilterCriteria,
    source: RoleSource,
    search_debouncer: Debouncer,
    search_tx: watch::Sender<String>,
    search_rx: watch::Receiver<String>,
    writes: Vec<JoinHandle<()>>,
}

impl ReviewContext {
    pub fn create(config: AegisConfig, backend: Arc<dyn ReviewBackend>) -> Self {
        let caches = ReviewCaches::new(Arc::clone(&backend), config.stats_ttl());
        let notifier = Notifier::default();
        let dispatcher = ActionDispatcher::new(
            Arc::clone(&backend),
            caches.clone(),
            notifier.clone(),
            config.history_capacity,
        );
        let (search_tx, search_rx) = watch::channel(String::new());
        info!(base_url = %config.base_url, "review context created");
        Self {
            search_debouncer: Debouncer::new(config.search_debounce()),
            config,
            backend,
            caches,
            dispatcher,
            notifier,
            criteria: FilterCriteria::default(),
            source: RoleSource::default(),
            search_tx,
            search_rx,
            writes: Vec::new(),
        }
    }

    pub fn config(&self) -> &AegisConfig {
        &self.config
    }

    pub fn caches(&self) -> &ReviewCaches {
        &self.caches
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    pub fn source(&self) -> RoleSource {
        self.source
    }

    /// Switch collections. Call [`load`](Self::load) afterwards.
    pub fn set_source(&mut self, source: RoleSource) {
        self.source = source;
    }

    // ── Loading ──

    /// Load the current role collection into local state.
    ///
    /// Roles missing document names get them from the role-document matrix.
    /// Edits whose writes are still in flight are replayed on top, so a
    /// reload never reverts them. Returns the number of roles loaded. A
    /// failed load leaves the previous collection (or an empty one) in place.
    pub async fn load(&mut self, force: bool) -> usize {
        let pending = self.caches.lookup.pending().clone();
        let mut attempt = 1;
        loop {
            let settled = pending.settle_count();
            let cache = match self.source {
                RoleSource::Aggregated => &self.caches.roles,
                RoleSource::Dictionary => &self.caches.dictionary,
            };
            let Some(mut roles) = cache.ensure_loaded(force).await else {
                warn!(source = ?self.source, "no roles available");
                return self.dispatcher.roles().len();
            };
            if roles.iter().any(|r| r.documents.is_empty())
                && let Some(matrix) = self.caches.matrix.ensure_loaded(false).await
            {
                matrix.attach_documents(&mut roles);
            }
            // A write that settled meanwhile may have made `roles` stale and
            // its edit is no longer replayed; fetch again.
            if pending.settle_count() != settled && attempt < MAX_LOAD_ATTEMPTS {
                debug!(attempt, "write settled during load, reloading");
                attempt += 1;
                continue;
            }
            pending.apply(&mut roles);
            let count = roles.len();
            self.dispatcher.replace_roles(roles);
            info!(count, source = ?self.source, pending = pending.len(), "roles loaded");
            return count;
        }
    }

    /// Review stats from the backend, or computed locally when unavailable.
    pub async fn stats(&self) -> ReviewStats {
        match self.caches.stats.ensure_loaded(false).await {
            Some(stats) => stats,
            None => ReviewStats::from_roles(self.dispatcher.roles()),
        }
    }

    pub async fn scan_history(&self) -> Vec<ScanHistoryEntry> {
        self.caches
            .scan_history
            .ensure_loaded(false)
            .await
            .unwrap_or_default()
    }

    /// Badge map: remote decisions with this session's changes on top.
    pub async fn badges(&self) -> DecisionMap {
        self.caches.lookup.snapshot().await
    }

    pub async fn facet_options(&self) -> FacetOptions {
        let history = self.scan_history().await;
        facet_options(self.dispatcher.roles(), &history)
    }

    pub async fn export_board(&self, format: BoardFormat) -> Result<Vec<u8>, SyncError> {
        self.backend.export_board(format).await
    }

    // ── Filtering ──

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        &mut self.criteria
    }

    /// Queue a typed search; it applies once typing pauses.
    pub fn type_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        let tx = self.search_tx.clone();
        self.search_debouncer.call(async move {
            tx.send_replace(text);
        });
    }

    /// Pull in a settled debounced search, if one landed.
    fn sync_search(&mut self) {
        if self.search_rx.has_changed().unwrap_or(false) {
            self.criteria.search = self.search_rx.borrow_and_update().clone();
        }
    }

    /// The filtered, sorted view of the local collection.
    pub fn visible(&mut self) -> Vec<Role> {
        self.sync_search();
        apply_filters(self.dispatcher.roles(), &self.criteria)
    }

    // ── Actions ──

    /// Dispatch an action; its backend write, if any, runs in the background.
    pub fn dispatch(&mut self, action: Action) {
        if action.is_mutation() {
            self.writes.retain(|h| !h.is_finished());
        }
        if let Some(handle) = self.dispatcher.dispatch(action) {
            self.writes.push(handle);
        }
    }

    /// Select every role in the current filtered view.
    pub fn select_visible(&mut self) {
        let role_names = self.visible().into_iter().map(|r| r.name).collect();
        self.dispatch(Action::SelectAll { role_names });
    }

    /// Wait for every outstanding background write.
    pub async fn flush(&mut self) {
        for handle in self.writes.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "background write panicked or was cancelled");
            }
        }
    }

    /// Flush pending writes and release every cache.
    pub async fn dispose(mut self) {
        self.search_debouncer.cancel();
        self.flush().await;
        self.caches.dispose().await;
        info!("review context disposed");
    }
}
