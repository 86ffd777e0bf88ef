//! Error types for the Monitis API client.

use thiserror::Error;

/// Base error type for Monitis operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to send request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    #[error("failed to decode response body {body}: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API responded with error message: {0}")]
    Api(#[from] ApiError),

    #[error("API responded with non-OK status: {}", .0.as_deref().unwrap_or("<missing>"))]
    Status(Option<String>),

    #[error("API response is missing field `{0}`")]
    MissingField(&'static str),
}

/// Raised when the API reports an error in the response envelope.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub response_data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, response_data: Option<serde_json::Value>) -> Self {
        Self {
            message: message.into(),
            response_data,
        }
    }
}
