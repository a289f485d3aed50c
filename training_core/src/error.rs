//! Error types for the training_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for training_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol file could not be understood
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A user intent that does not apply to the current session state.
    ///
    /// Never fatal: the session is left exactly as it was.
    #[error("Invalid action: {0}")]
    InvalidIntent(String),

    /// Section label not present in the loaded protocol
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Completion sink rejected or could not accept a record
    #[error("Sink error: {0}")]
    Sink(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn intent(msg: impl Into<String>) -> Self {
        Error::InvalidIntent(msg.into())
    }
}
