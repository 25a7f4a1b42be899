//! Error types for chapter generation tracking and export.

use thiserror::Error;

/// Errors surfaced by the generation tracker, the backend client, and the exporter.
#[derive(Debug, Error)]
pub enum ComicError {
    #[error("Backend unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Invalid story choice: {0}")]
    InvalidChoice(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend rejected request with status {status}: {detail}")]
    RemoteRejected { status: u16, detail: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Chapter {0} is already being observed")]
    AlreadyObserved(String),

    #[error("Connection lost after {attempts} poll attempts")]
    ConnectionLost { attempts: u32 },

    #[error("Generation timed out after {attempts} poll attempts")]
    GenerationTimedOut { attempts: u32 },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Observation cancelled")]
    Cancelled,

    #[error("Nothing to export: chapter has no panels")]
    NothingToExport,

    #[error("Could not embed panel {index}: {reason}")]
    EmbedFailure { index: i64, reason: String },

    #[error("Document assembly failed: {0}")]
    DocumentAssemblyFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComicError {
    /// Whether re-triggering the same user action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComicError::RemoteUnavailable(_)
                | ComicError::RemoteRejected { .. }
                | ComicError::ConnectionLost { .. }
                | ComicError::GenerationTimedOut { .. }
                | ComicError::GenerationFailed(_)
                | ComicError::DocumentAssemblyFailure(_)
                | ComicError::Io(_)
        )
    }
}

impl From<config::ConfigError> for ComicError {
    fn from(err: config::ConfigError) -> Self {
        ComicError::ConfigError(err.to_string())
    }
}
