use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown adjudication status: {0}")]
    UnknownStatus(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("unknown export format: {0}")]
    UnknownFormat(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
