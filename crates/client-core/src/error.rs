//! Error types for the client session layer

use thiserror::Error;

use peerlink_media_core::MediaError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the session layer
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint has no id; validated before any construction or I/O
    #[error("endpoint has no id")]
    MissingEndpointId,

    /// A call or direct connection could not be built
    #[error("session construction failed: {reason}")]
    ConstructionFailed { reason: String },

    /// The signaling transport failed to deliver
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Local media error
    #[error("media error: {0}")]
    Media(#[from] MediaError),

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ClientError {
    /// Create a construction error
    pub fn construction_failed(reason: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
