//! Error types for the kiosk session service.

use thiserror::Error;

use crate::SessionId;

/// Main error type for kiosk session operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session record not found in the store
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Store reported a failure (constraint, unavailable, ...)
    #[error("Store error: {0}")]
    Store(String),

    /// Transport-level failure talking to the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Backend answered but the payload was not what we expected
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Activity event name not in the recognised set
    #[error("Unknown activity event: {0}")]
    UnknownActivityEvent(String),

    /// Department tag not recognised
    #[error("Unknown department: {0}")]
    UnknownDepartment(String),

    /// Kiosk identifier failed validation
    #[error("Invalid kiosk id: {0}")]
    InvalidKioskId(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
