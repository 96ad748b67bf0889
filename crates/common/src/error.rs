//! Error types shared across Shortsmith crates.

use std::path::PathBuf;

/// Top-level error type for Shortsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum ShortsmithError {
    #[error("Plan error: {message}")]
    Plan { message: String },

    #[error("Media acquisition failed: {message}")]
    Acquisition { message: String },

    #[error("Missing dependency: {message}")]
    DependencyMissing { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Font error: {message}")]
    Font { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Manifest error: {message}")]
    Manifest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ShortsmithError.
pub type ShortsmithResult<T> = Result<T, ShortsmithError>;

impl ShortsmithError {
    pub fn plan(msg: impl Into<String>) -> Self {
        Self::Plan {
            message: msg.into(),
        }
    }

    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition {
            message: msg.into(),
        }
    }

    pub fn dependency_missing(msg: impl Into<String>) -> Self {
        Self::DependencyMissing {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error makes the whole batch meaningless.
    ///
    /// Render and manifest failures are scoped to the work that produced
    /// them; everything that
    /// concerns shared inputs (plan, source, fonts, tools, config) is fatal.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::Plan { .. }
                | Self::Acquisition { .. }
                | Self::DependencyMissing { .. }
                | Self::Probe { .. }
                | Self::Font { .. }
                | Self::Config { .. }
                | Self::FileNotFound { .. }
        )
    }
}
