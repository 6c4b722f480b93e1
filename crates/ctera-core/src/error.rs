//! Error types for module execution

use thiserror::Error;

/// Main error type raised while a module executes.
///
/// Every variant is converted into a failed outcome by the runner; nothing
/// here escapes an invocation as a panic.
#[derive(Debug, Error)]
pub enum CteraError {
    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{message}")]
    Precondition { message: String },

    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Certificate error: {message}")]
    Certificate { message: String },

    #[error("{message}")]
    Unsupported { message: String },

    #[error("{0}")]
    Argument(#[from] ArgumentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CteraError {
    pub fn precondition(message: impl Into<String>) -> Self {
        CteraError::Precondition {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        CteraError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by a transport talking to a CTERA host
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Object not found: {path}")]
    NotFound { path: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response parsing failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Build from an HTTP status, folding 404 into [`ClientError::NotFound`].
    pub fn from_status(status: u16, path: &str, message: impl Into<String>) -> Self {
        match status {
            404 => ClientError::NotFound {
                path: path.to_string(),
            },
            401 | 403 => ClientError::Authentication {
                message: message.into(),
            },
            _ => ClientError::Http {
                status,
                message: message.into(),
            },
        }
    }

    /// The 404-equivalent signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Module argument validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing required arguments: {0}")]
    Missing(String),

    #[error("{state} is {value} but all of the following are missing: {missing}")]
    RequiredIf {
        state: String,
        value: String,
        missing: String,
    },

    #[error("argument parsing failed: {0}")]
    Invalid(String),
}
