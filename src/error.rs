//! Error types shared by the stores.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Errors surfaced to callers of the text cache and the stores.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The operation needs a signed-in owner and the session is anonymous.
    #[error("Sign in required")]
    Unauthenticated,

    /// Transport, query or constraint failure reported by the remote service.
    #[error("{0}")]
    Remote(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A named file or bundled resource does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A row or document did not have the expected shape.
    #[error("Failed to decode {0}")]
    Decode(String),
}

impl SyncError {
    /// True when the caller should prompt for sign-in instead of showing a failure.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, SyncError::Unauthenticated)
    }
}

impl From<GatewayError> for SyncError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected { message, .. } => SyncError::Remote(message),
            GatewayError::Decode(message) => SyncError::Decode(message),
            other => SyncError::Remote(other.to_string()),
        }
    }
}
