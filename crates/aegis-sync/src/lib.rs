//! Backend access for the review client: HTTP transport, CSRF tokens, single-flight caches.

mod backend;
pub mod cache;
pub mod csrf;
mod error;

#[cfg(feature = "http")]
pub mod http;

pub use backend::{BoardFormat, Envelope, ReviewBackend};
pub use cache::{CachePolicy, RemoteCache};
pub use csrf::CsrfTokens;
pub use error::SyncError;

#[cfg(feature = "http")]
pub use http::HttpBackend;
