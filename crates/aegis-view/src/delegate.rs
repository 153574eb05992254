//! Declarative event delegation.
//!
//! One delegator serves every mounted container. Rendered elements only
//! describe what they do through `data-*` attributes; an event carries the
//! attributes of the element it came from, and [`EventDelegator::handle`]
//! decodes them into an [`Intent`]. Re-rendering never touches handlers.

use std::collections::{HashMap, HashSet};

use aegis_core::{Action, AdjudicationStatus, FunctionTag, SortField};
use tracing::debug;

use crate::ViewMode;

/// An interaction on a rendered element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiEvent {
    /// Value of `data-action` (or `data-drop-action` for drops).
    pub action: String,
    /// The element's other `data-*` attributes, without the `data-` prefix.
    pub data: HashMap<String, String>,
}

impl UiEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// What the view layer should do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Hand to the action dispatcher.
    Dispatch(Action),
    /// Select every role in the current filtered view.
    SelectVisible,
    SortBy(SortField),
    SetViewMode(ViewMode),
    ClearFilters,
}

#[derive(Debug, Default)]
pub struct EventDelegator {
    attached: HashSet<String>,
}

impl EventDelegator {
    /// Start listening on a container. Returns false if already attached.
    pub fn attach(&mut self, container_id: &str) -> bool {
        let fresh = self.attached.insert(container_id.to_string());
        if fresh {
            debug!(container = container_id, "delegator attached");
        }
        fresh
    }

    pub fn detach(&mut self, container_id: &str) -> bool {
        self.attached.remove(container_id)
    }

    pub fn is_attached(&self, container_id: &str) -> bool {
        self.attached.contains(container_id)
    }

    pub fn listener_count(&self) -> usize {
        self.attached.len()
    }

    /// Decode an event raised inside `container_id`.
    ///
    /// Events from containers without a listener, with an unknown action,
    /// or missing a required attribute yield `None`.
    pub fn handle(&self, container_id: &str, event: &UiEvent) -> Option<Intent> {
        if !self.is_attached(container_id) {
            debug!(container = container_id, "event on unattached container ignored");
            return None;
        }
        let intent = decode(event);
        if intent.is_none() {
            debug!(action = %event.action, "event not understood");
        }
        intent
    }
}

fn decode(event: &UiEvent) -> Option<Intent> {
    let role = || event.get("role").map(str::to_string);
    let status = || event.get("status")?.parse::<AdjudicationStatus>().ok();

    let intent = match event.action.as_str() {
        "set-status" | "drop" => Intent::Dispatch(Action::SetStatus {
            role_name: role()?,
            status: status()?,
        }),
        "bulk-status" => Intent::Dispatch(Action::BulkSetStatus { status: status()? }),
        "toggle-select" => Intent::Dispatch(Action::ToggleSelect { role_name: role()? }),
        "select-all" => Intent::SelectVisible,
        "clear-selection" => Intent::Dispatch(Action::ClearSelection),
        "assign-tag" => {
            let code = event.get("tag")?.to_string();
            Intent::Dispatch(Action::AssignTag {
                role_name: role()?,
                tag: FunctionTag {
                    name: event.get("tag-name").unwrap_or(code.as_str()).to_string(),
                    color: event.get("tag-color").unwrap_or_default().to_string(),
                    code,
                },
            })
        }
        "remove-tag" => Intent::Dispatch(Action::RemoveTag {
            role_name: role()?,
            code: event.get("tag")?.to_string(),
        }),
        "undo" => Intent::Dispatch(Action::Undo),
        "redo" => Intent::Dispatch(Action::Redo),
        "sort" => Intent::SortBy(event.get("field")?.parse().ok()?),
        "view-mode" => Intent::SetViewMode(event.get("mode")?.parse().ok()?),
        "clear-filters" => Intent::ClearFilters,
        _ => return None,
    };
    Some(intent)
}
