use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ViewError;

/// Alternate presentations of the same filtered collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Card,
    Kanban,
    Tree,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [Self::Table, Self::Card, Self::Kanban, Self::Tree];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Card => "card",
            Self::Kanban => "kanban",
            Self::Tree => "tree",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "card" | "cards" => Ok(Self::Card),
            "kanban" | "board" => Ok(Self::Kanban),
            "tree" | "hierarchy" => Ok(Self::Tree),
            other => Err(ViewError::UnknownViewMode(other.to_string())),
        }
    }
}
