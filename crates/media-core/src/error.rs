//! Error types for local media operations

use thiserror::Error;

use crate::engine::CaptureErrorCode;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Classification of an asynchronous capture failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureFailureKind {
    /// The user or platform denied the capture request
    PermissionDenied,
    /// Any other engine-reported failure
    Unknown,
}

impl std::fmt::Display for CaptureFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureFailureKind::PermissionDenied => write!(f, "permission denied"),
            CaptureFailureKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Errors that can occur managing local media
#[derive(Debug, Error)]
pub enum MediaError {
    /// Capture was requested without constraints; fails before any I/O
    #[error("capture constraints are required")]
    MissingConstraints,

    /// The operation is not valid for this instance
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Screen capture has no platform integration available
    #[error("screen capture unsupported: {message}")]
    UnsupportedPlatform { message: String },

    /// The media engine failed the capture request
    #[error("capture failed: {kind}")]
    CaptureFailed { kind: CaptureFailureKind },
}

impl MediaError {
    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create an unsupported platform error
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            message: message.into(),
        }
    }

    /// Classify an engine error code into a capture failure
    pub fn capture_failed(code: CaptureErrorCode) -> Self {
        let kind = match code {
            CaptureErrorCode::PermissionDenied => CaptureFailureKind::PermissionDenied,
            CaptureErrorCode::Failed(_) => CaptureFailureKind::Unknown,
        };
        Self::CaptureFailed { kind }
    }
}
