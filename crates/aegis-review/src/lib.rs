//! Review session state: remote caches, adjudication lookup, action dispatch.

mod caches;
mod context;
pub mod debounce;
mod dispatcher;
mod lookup;
mod pending;
pub mod notice;

#[cfg(test)]
mod testing;

pub use caches::ReviewCaches;
pub use context::{ReviewContext, RoleSource};
pub use debounce::Debouncer;
pub use dispatcher::ActionDispatcher;
pub use lookup::{AdjudicationLookup, DecisionMap};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use pending::{Edit, PendingEdits};
