//! Action dispatcher: optimistic local updates with fire-and-forget persistence.
//!
//! Every mutation follows the same shape:
//!
//! 1. Record the transition on the undo history (unless replaying).
//! 2. Apply it to the local role collection and register it as a pending
//!    edit, which reloads replay until the write settles.
//! 3. Spawn the backend write and return its handle; callers may ignore it.
//! 4. When the write settles, whatever the outcome, invalidate the caches
//!    it can make stale and settle the pending edit.
//!
//! A failed write is logged and, for backend-reported failures, announced as
//! a [`Notice`]. The local change is not rolled back; the next load shows
//! what the server holds.

use std::collections::BTreeSet;
use std::sync::Arc;

use aegis_core::{Action, AdjudicationStatus, Decision, FunctionTag, Role, StatusChange, UndoHistory};
use aegis_sync::{ReviewBackend, SyncError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notice::{Notice, Notifier};
use crate::pending::Edit;
use crate::ReviewCaches;

/// Whether a status change goes onto the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    Yes,
    /// Undo/redo replays must not record themselves.
    Suppressed,
}

pub struct ActionDispatcher {
    roles: Vec<Role>,
    selection: BTreeSet<String>,
    history: UndoHistory<StatusChange>,
    backend: Arc<dyn ReviewBackend>,
    caches: ReviewCaches,
    notifier: Notifier,
}

impl ActionDispatcher {
    pub fn new(
        backend: Arc<dyn ReviewBackend>,
        caches: ReviewCaches,
        notifier: Notifier,
        history_capacity: usize,
    ) -> Self {
        Self {
            roles: Vec::new(),
            selection: BTreeSet::new(),
            history: UndoHistory::with_capacity(history_capacity),
            backend,
            caches,
            notifier,
        }
    }

    // ── Local state ──

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Replace the local collection, e.g. after a reload.
    ///
    /// Selected names that no longer exist are dropped from the selection.
    pub fn replace_roles(&mut self, roles: Vec<Role>) {
        self.selection
            .retain(|name| roles.iter().any(|r| &r.name == name));
        self.roles = roles;
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    fn role_mut(&mut self, name: &str) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.name == name)
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn history(&self) -> &UndoHistory<StatusChange> {
        &self.history
    }

    // ── Dispatch ──

    /// Apply one action. Returns the handle of the spawned backend write, if any.
    pub fn dispatch(&mut self, action: Action) -> Option<JoinHandle<()>> {
        debug!(?action, "dispatch");
        match action {
            Action::SetStatus { role_name, status } => self.set_status(&role_name, status),
            Action::BulkSetStatus { status } => self.bulk_set_status_selected(status),
            Action::ToggleSelect { role_name } => {
                self.toggle_select(&role_name);
                None
            }
            Action::SelectAll { role_names } => {
                self.select_all(role_names);
                None
            }
            Action::ClearSelection => {
                self.selection.clear();
                None
            }
            Action::AssignTag { role_name, tag } => self.assign_tag(&role_name, tag),
            Action::RemoveTag { role_name, code } => self.remove_tag(&role_name, &code),
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),
        }
    }

    pub fn set_status(&mut self, role_name: &str, status: AdjudicationStatus) -> Option<JoinHandle<()>> {
        self.apply_status(role_name, status, Record::Yes)
    }

    /// Revert the most recent recorded transition. No-op when exhausted.
    pub fn undo(&mut self) -> Option<JoinHandle<()>> {
        let change = self.history.undo()?;
        info!(role = %change.role_name, status = %change.prev, "undo");
        self.apply_status(&change.role_name, change.prev, Record::Suppressed)
    }

    /// Replay the next undone transition. No-op when exhausted.
    pub fn redo(&mut self) -> Option<JoinHandle<()>> {
        let change = self.history.redo()?;
        info!(role = %change.role_name, status = %change.next, "redo");
        self.apply_status(&change.role_name, change.next, Record::Suppressed)
    }

    fn apply_status(
        &mut self,
        role_name: &str,
        status: AdjudicationStatus,
        record: Record,
    ) -> Option<JoinHandle<()>> {
        let Some(role) = self.role_mut(role_name) else {
            warn!(role = %role_name, "adjudication for unknown role ignored");
            return None;
        };
        let prev = role.status;
        if prev == status {
            return None;
        }
        role.status = status;
        if record == Record::Yes {
            self.history.record(StatusChange {
                role_name: role_name.to_string(),
                prev,
                next: status,
            });
        }
        let ticket = self.caches.lookup.pending().record(role_name, Edit::Status(status));

        let decision = Decision::new(role_name, status);
        Some(self.persist("adjudicate", vec![ticket], None, move |backend| async move {
            backend.adjudicate(&decision).await
        }))
    }

    /// Apply one status to the given roles with a single batched write, then
    /// clear the selection.
    pub fn bulk_set_status<I>(&mut self, role_names: I, status: AdjudicationStatus) -> Option<JoinHandle<()>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut decisions = Vec::new();
        let mut tickets = Vec::new();
        for name in role_names {
            let Some(role) = self.role_mut(&name) else {
                warn!(role = %name, "bulk adjudication skipped unknown role");
                continue;
            };
            let prev = role.status;
            if prev == status {
                continue;
            }
            role.status = status;
            tickets.push(self.caches.lookup.pending().record(&name, Edit::Status(status)));
            self.history.record(StatusChange {
                role_name: name.clone(),
                prev,
                next: status,
            });
            decisions.push(Decision::new(name, status));
        }
        self.selection.clear();

        if decisions.is_empty() {
            return None;
        }
        info!(count = decisions.len(), status = %status, "bulk adjudication");
        let done = Notice::info(format!("{} roles marked {}", decisions.len(), status.label()));
        Some(self.persist("adjudicate_batch", tickets, Some(done), move |backend| async move {
            backend.adjudicate_batch(&decisions).await.map(|_| ())
        }))
    }

    fn bulk_set_status_selected(&mut self, status: AdjudicationStatus) -> Option<JoinHandle<()>> {
        let names: Vec<String> = self.selection.iter().cloned().collect();
        self.bulk_set_status(names, status)
    }

    pub fn assign_tag(&mut self, role_name: &str, tag: FunctionTag) -> Option<JoinHandle<()>> {
        let role = self.role_mut(role_name)?;
        if role.has_tag(&tag.code) {
            return None;
        }
        let code = tag.code.clone();
        role.function_tags.push(tag.clone());
        let ticket = self.caches.lookup.pending().record(role_name, Edit::AddTag(tag));
        let name = role_name.to_string();
        Some(self.persist("assign_tag", vec![ticket], None, move |backend| async move {
            backend.assign_tag(&name, &code).await
        }))
    }

    pub fn remove_tag(&mut self, role_name: &str, code: &str) -> Option<JoinHandle<()>> {
        let role = self.role_mut(role_name)?;
        let before = role.function_tags.len();
        role.function_tags.retain(|t| t.code != code);
        if role.function_tags.len() == before {
            return None;
        }
        let ticket = self
            .caches
            .lookup
            .pending()
            .record(role_name, Edit::RemoveTag(code.to_string()));
        let (name, code) = (role_name.to_string(), code.to_string());
        Some(self.persist("remove_tag", vec![ticket], None, move |backend| async move {
            backend.remove_tag(&name, &code).await
        }))
    }

    pub fn toggle_select(&mut self, role_name: &str) {
        if !self.selection.remove(role_name) && self.role(role_name).is_some() {
            self.selection.insert(role_name.to_string());
        }
    }

    pub fn select_all(&mut self, role_names: Vec<String>) {
        for name in role_names {
            if self.role(&name).is_some() {
                self.selection.insert(name);
            }
        }
    }

    /// Spawn a backend write, then report its outcome, invalidate caches and
    /// settle the edits behind `tickets`. `done` is announced on success.
    fn persist<F, Fut>(
        &self,
        op: &'static str,
        tickets: Vec<u64>,
        done: Option<Notice>,
        write: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Arc<dyn ReviewBackend>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let caches = self.caches.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            caches.invalidate_after_write().await;
            match write(backend).await {
                Ok(()) => {
                    debug!(op, "write persisted");
                    if let Some(notice) = done {
                        notifier.send(notice);
                    }
                }
                Err(err) => {
                    warn!(op, error = %err, "write failed, local state kept");
                    if err.is_user_facing() {
                        notifier.send(Notice::error(err.to_string()));
                    }
                }
            }
            caches.invalidate_after_write().await;
            caches.lookup.pending().settle(&tickets);
        })
    }
}
