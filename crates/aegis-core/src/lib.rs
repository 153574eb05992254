//! Core review types, filter engine, undo history, export, and configuration for AEGIS.

pub mod action;
pub mod config;
mod error;
pub mod export;
pub mod filter;
pub mod history;
pub mod role;
pub mod sort;

pub use action::Action;
pub use config::AegisConfig;
pub use error::CoreError;
pub use export::{ExportFormat, csv_escape, export_filename, roles_to_csv, roles_to_json};
pub use filter::{FacetOptions, FacetSelection, FilterCriteria, apply_filters, facet_options};
pub use history::{StatusChange, UndoHistory};
pub use role::{
    AdjudicationStatus, Decision, FunctionTag, ReviewStats, Role, RoleDocumentMatrix,
    ScanHistoryEntry,
};
pub use sort::{SortDirection, SortField, SortSpec, sort_roles};
