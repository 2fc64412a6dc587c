//! Error types for gatelog

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// A required field was blank. Raised before any state change.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote store is not configured or cannot be reached.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote store answered the call with an error.
    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    /// Transport or tool failure of the plate reader. "Nothing recognised"
    /// is not an error.
    #[error("Plate recognition failed: {0}")]
    OcrFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures of the remote store itself (as opposed to caller
    /// mistakes), i.e. the kinds that trigger an optimistic rollback.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteUnavailable(_) | Error::RemoteOperationFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
