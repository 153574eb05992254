//! User actions understood by the review dispatcher.

use crate::{AdjudicationStatus, FunctionTag};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetStatus {
        role_name: String,
        status: AdjudicationStatus,
    },
    /// Apply one status to every selected role.
    BulkSetStatus { status: AdjudicationStatus },
    ToggleSelect { role_name: String },
    /// Select the given roles (typically everything visible).
    SelectAll { role_names: Vec<String> },
    ClearSelection,
    AssignTag { role_name: String, tag: FunctionTag },
    RemoveTag { role_name: String, code: String },
    Undo,
    Redo,
}

impl Action {
    /// Whether the action may write to the backend.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::ToggleSelect { .. } | Self::SelectAll { .. } | Self::ClearSelection
        )
    }
}
