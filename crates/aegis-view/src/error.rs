use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("unknown view mode: {0}")]
    UnknownViewMode(String),

    #[error("no preferences location available")]
    NoPreferencesDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
