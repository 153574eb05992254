//! Optimistic edits whose backend write has not settled yet.
//!
//! Each edit gets a ticket when it is dispatched and is settled by that
//! ticket once its write finishes, successfully or not. Until then it is
//! replayed over anything loaded from the server, so a reload racing the
//! write cannot undo the local change. After settling, server data is the
//! only truth again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aegis_core::{AdjudicationStatus, FunctionTag, Role};
use tracing::debug;

use crate::lookup::DecisionMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Status(AdjudicationStatus),
    AddTag(FunctionTag),
    RemoveTag(String),
}

#[derive(Debug)]
struct Entry {
    ticket: u64,
    role_name: String,
    edit: Edit,
}

#[derive(Debug, Default)]
struct State {
    next_ticket: u64,
    /// Bumped on every settle; lets readers detect a settle mid-load.
    settled: u64,
    entries: Vec<Entry>,
}

/// Shared, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct PendingEdits {
    state: Arc<Mutex<State>>,
}

impl PendingEdits {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an edit and return its ticket.
    pub fn record(&self, role_name: &str, edit: Edit) -> u64 {
        let mut state = self.lock();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.entries.push(Entry {
            ticket,
            role_name: role_name.to_string(),
            edit,
        });
        ticket
    }

    /// Forget the edits behind `tickets`; their writes have finished.
    pub fn settle(&self, tickets: &[u64]) {
        let mut state = self.lock();
        state.entries.retain(|e| !tickets.contains(&e.ticket));
        state.settled += 1;
        debug!(count = tickets.len(), outstanding = state.entries.len(), "edits settled");
    }

    /// Number of settles so far.
    pub fn settle_count(&self) -> u64 {
        self.lock().settled
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latest unsettled status per role.
    pub fn statuses(&self) -> DecisionMap {
        let state = self.lock();
        let mut map = DecisionMap::new();
        for entry in &state.entries {
            if let Edit::Status(status) = entry.edit {
                map.insert(entry.role_name.clone(), status);
            }
        }
        map
    }

    /// Replay every unsettled edit, oldest first, onto `roles`.
    pub fn apply(&self, roles: &mut [Role]) {
        let state = self.lock();
        for entry in &state.entries {
            let Some(role) = roles.iter_mut().find(|r| r.name == entry.role_name) else {
                continue;
            };
            match &entry.edit {
                Edit::Status(status) => role.status = *status,
                Edit::AddTag(tag) => {
                    if !role.has_tag(&tag.code) {
                        role.function_tags.push(tag.clone());
                    }
                }
                Edit::RemoveTag(code) => role.function_tags.retain(|t| &t.code != code),
            }
        }
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(code: &str) -> FunctionTag {
        FunctionTag {
            code: code.into(),
            name: code.into(),
            color: String::new(),
        }
    }

    #[test]
    fn replays_in_order_until_settled() {
        let pending = PendingEdits::default();
        let first = pending.record("PM", Edit::Status(AdjudicationStatus::Confirmed));
        let second = pending.record("PM", Edit::Status(AdjudicationStatus::Rejected));
        pending.record("PM", Edit::AddTag(tag("MGT")));

        let mut roles = vec![Role::named("PM"), Role::named("QA")];
        pending.apply(&mut roles);
        assert_eq!(roles[0].status, AdjudicationStatus::Rejected);
        assert!(roles[0].has_tag("MGT"));
        assert_eq!(roles[1], Role::named("QA"));
        assert_eq!(pending.statuses().get("PM"), Some(&AdjudicationStatus::Rejected));

        pending.settle(&[second]);
        assert_eq!(pending.statuses().get("PM"), Some(&AdjudicationStatus::Confirmed));
        pending.settle(&[first]);
        assert!(pending.statuses().is_empty());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.settle_count(), 2);
    }

    #[test]
    fn remove_tag_replays() {
        let pending = PendingEdits::default();
        pending.record("PM", Edit::RemoveTag("MGT".into()));
        let mut role = Role::named("PM");
        role.function_tags.push(tag("MGT"));
        let mut roles = vec![role];
        pending.apply(&mut roles);
        assert!(roles[0].function_tags.is_empty());
    }
}
