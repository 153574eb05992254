use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered `{"success": false, "error": ...}`.
    #[error("{0}")]
    Backend(String),

    #[error("response envelope had no data")]
    MissingData,
}

impl SyncError {
    /// Logical failures are shown to the user; transport failures are only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
