//! Error types for geovision.

use thiserror::Error;

/// Result type alias using geovision's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for geovision operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid service credential / model configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model service rejected or failed the call
    #[error("Inference error: {0}")]
    Inference(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An analysis run is already in flight
    #[error("Analysis already in progress")]
    Busy,
}

impl Error {
    /// True for failures of the model service boundary.
    ///
    /// These are the errors the pipeline collapses into its single
    /// user-facing failure message.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Inference(_) | Error::Request(_) | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
