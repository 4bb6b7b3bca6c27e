//! Error types for the dispersion image pipeline.

use thiserror::Error;

/// Result type alias using DispersionError.
pub type DispersionResult<T> = Result<T, DispersionError>;

/// Primary error type for loading, aggregating, classifying and rendering.
///
/// Every variant is fatal for a run; nothing is retried.
#[derive(Debug, Error)]
pub enum DispersionError {
    // === Input Errors ===
    /// Missing or malformed source file, or a grid convention we cannot handle.
    #[error("Input error: {0}")]
    Input(String),

    // === Configuration Errors ===
    /// Invalid or contradictory classification or run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument outside the domain of an operation (programming error class).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // === Output Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispersionError {
    pub fn input(msg: impl Into<String>) -> Self {
        DispersionError::Input(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DispersionError::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        DispersionError::Render(msg.into())
    }

    /// Short category name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DispersionError::Input(_) => "input",
            DispersionError::Config(_) => "config",
            DispersionError::InvalidArgument(_) => "invalid_argument",
            DispersionError::Render(_) => "render",
            DispersionError::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for DispersionError {
    fn from(err: serde_json::Error) -> Self {
        DispersionError::Render(format!("JSON error: {}", err))
    }
}
