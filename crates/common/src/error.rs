//! Error types shared across Capcue crates.

use std::path::PathBuf;

/// Top-level error type for Capcue operations.
///
/// Segmentation and highlight computation never produce errors: malformed
/// transcript data is clamped instead. Only configuration loading, project
/// I/O and the export pipeline have genuine failure paths.
#[derive(Debug, thiserror::Error)]
pub enum CapcueError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Compositing failed: {message}")]
    Compositing { message: String },

    #[error("An export is already in progress for this session")]
    ConcurrentExportRejected,

    #[error("Export cancelled")]
    Cancelled,

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CapcueError.
pub type CapcueResult<T> = Result<T, CapcueError>;

impl CapcueError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the user can simply retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Compositing { .. }
                | Self::ConcurrentExportRejected
                | Self::Cancelled
                | Self::Io(_)
        )
    }
}
