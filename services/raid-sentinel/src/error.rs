//! Error types for the RAID sentinel

/// Errors that can occur in the RAID sentinel
#[derive(Debug, thiserror::Error)]
pub enum RaidSentinelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Status command failed: {0}")]
    Execution(String),

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for RAID sentinel operations
pub type Result<T> = std::result::Result<T, RaidSentinelError>;
