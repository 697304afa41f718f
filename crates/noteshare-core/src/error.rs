//! Error types for noteshare.

use thiserror::Error;

/// Result type alias using noteshare's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for noteshare operations.
///
/// This is the closed application-level taxonomy every remote failure is
/// mapped into. The remote services do not expose stable error codes to
/// clients, so `noteshare-remote` classifies raw responses into these
/// variants (status tier first, keyword tier as fallback).
#[derive(Error, Debug)]
pub enum Error {
    /// Local validation failure; never contacts the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// No active session where one is required
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Authenticated but denied by a service policy
    #[error("Permission denied: {0}")]
    PolicyDenied(String),

    /// Row insert rejected by the data service's row-level policy
    #[error("Row policy rejection: {0}")]
    RowPolicy(String),

    /// Storage bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Object name conflict on a no-overwrite upload
    #[error("Name conflict: {0}")]
    Conflict(String),

    /// Connectivity failure reaching a remote service
    #[error("Network error: {0}")]
    Network(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Stored object is not publicly reachable
    #[error("Preview unavailable: {0}")]
    PreviewUnavailable(String),

    /// Remote service throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed in an unclassified way
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the failure never left the process (no network attempt).
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Config(_))
    }

    /// True when the user should be sent to the login view.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Error::AuthRequired(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::Network(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
