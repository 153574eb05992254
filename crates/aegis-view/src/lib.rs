//! View layer: full-replace renderers, event delegation, and view preferences.

pub mod delegate;
mod error;
pub mod markup;
mod mode;
pub mod pipeline;
pub mod prefs;
pub mod render;

pub use delegate::{EventDelegator, Intent, UiEvent};
pub use error::ViewError;
pub use mode::ViewMode;
pub use pipeline::{Container, RenderPipeline};
pub use prefs::PreferenceStore;
pub use render::{RenderContext, empty_message, render};
