use thiserror::Error;

/// Errors that can occur during stream acquisition or recorder control.
///
/// Cloneable so the session can keep the most recent error in its error
/// slot while also delivering it through the delegate callback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("invalid constraints: {0}")]
    InvalidConstraints(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("recorder failed: {0}")]
    RecorderFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
