//! Common API types and data structures

use crate::core::Position;
use crate::platform::PlatformError;
use crate::utils::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Result type for API operations
pub type GeoResult<T> = Result<T, GeolocatorError>;

/// API error types
#[derive(Debug, Error)]
pub enum GeolocatorError {
    /// Argument outside its accepted range
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    /// Call not allowed in the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The caller's cancellation token was signalled
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reason carried by a position error event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("connection to the location service failed (code {code})")]
    ConnectionFailed { code: i32 },
    #[error("connection to the location service was suspended (cause {cause})")]
    ConnectionSuspended { cause: i32 },
    #[error("location updates could not be requested: {reason}")]
    UpdateRequestFailed { reason: String },
}

/// Domain event produced from service deliveries
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Changed(Position),
    Error(PositionError),
}

/// Timeout accepted by one-shot position queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    #[default]
    Infinite,
    After(Duration),
}

impl Timeout {
    /// Millisecond value meaning "no timeout"
    pub const INFINITE_MS: i64 = -1;

    /// Convert a millisecond count, where `INFINITE_MS` means no timeout
    /// and any other negative value is rejected.
    pub fn from_millis(timeout_ms: i64) -> GeoResult<Self> {
        match timeout_ms {
            Self::INFINITE_MS => Ok(Timeout::Infinite),
            ms if ms < 0 => Err(GeolocatorError::InvalidArgument {
                name: "timeout_ms",
                reason: format!("must be non-negative or infinite, got {}", ms),
            }),
            ms => Ok(Timeout::After(Duration::from_millis(ms as u64))),
        }
    }
}

/// Cooperative cancellation flag shared between caller and geolocator
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Most recent fix seen by a geolocator, readable from any thread
#[derive(Debug, Clone, Default)]
pub struct LastKnownPosition {
    inner: Arc<Mutex<Option<Position>>>,
}

impl LastKnownPosition {
    pub fn get(&self) -> Option<Position> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set(&self, position: Position) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(position);
    }
}

/// Callback function type for position updates
pub type PositionCallback = Box<dyn Fn(&Position) + Send>;

/// Callback function type for position errors
pub type ErrorCallback = Box<dyn Fn(&PositionError) + Send>;

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub(crate) fn new(id: u32) -> Self {
        SubscriptionHandle(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_timeout_from_millis() {
        assert_eq!(Timeout::from_millis(-1).unwrap(), Timeout::Infinite);
        assert_eq!(Timeout::from_millis(0).unwrap(), Timeout::After(Duration::ZERO));
        assert_eq!(
            Timeout::from_millis(1500).unwrap(),
            Timeout::After(Duration::from_millis(1500))
        );
        assert!(matches!(
            Timeout::from_millis(-2),
            Err(GeolocatorError::InvalidArgument { name: "timeout_ms", .. })
        ));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_last_known_position_across_threads() {
        let cache = LastKnownPosition::default();
        assert!(cache.get().is_none());

        let writer = cache.clone();
        std::thread::spawn(move || {
            let pos = Position::new(1.0, 2.0, Utc.timestamp_millis_opt(0).unwrap()).unwrap();
            writer.set(pos);
        })
        .join()
        .unwrap();

        assert_eq!(cache.get().map(|p| p.latitude), Some(1.0));
    }
}
