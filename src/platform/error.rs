//! Platform error types

use crate::core::InvalidPosition;
use thiserror::Error;

/// Errors raised by or about the platform collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    /// Operation needs a connected push-location service
    #[error("location service is not connected")]
    NotConnected,
    /// The service refused or dropped the connection
    #[error("location service connection failed (code {code})")]
    ConnectionFailed { code: i32 },
    /// The settings dialog could not be launched
    #[error("settings resolution failed: {reason}")]
    ResolutionFailed { reason: String },
    /// A raw location could not be turned into a position
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] InvalidPosition),
    /// Timestamp outside the representable range
    #[error("location timestamp out of range: {time_ms} ms")]
    InvalidTimestamp { time_ms: i64 },
    /// The receiving side of the event channel is gone
    #[error("location event channel closed")]
    ChannelClosed,
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
