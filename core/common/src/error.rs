//! Common error types for DriveDesk.

use thiserror::Error;

/// Top-level error type for DriveDesk operations.
///
/// "Nothing matched" is never an error here: lookups return `Ok(None)` and
/// callers decide what an absent entry means. Everything below is a real
/// failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Service-account credential could not be decoded or used.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Token exchange or bearer authentication failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Transport-level failure talking to the remote service.
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with an unexpected status.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Resource addressed by id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote service refused the operation (quota, sharing, scope).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Operation has no implementation for this kind of entry.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Zip archive could not be written.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Tabular export could not be produced.
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure came from talking to the remote service, as
    /// opposed to bad input or local I/O.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_)
                | Error::Network(_)
                | Error::Remote(_)
                | Error::PermissionDenied(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
