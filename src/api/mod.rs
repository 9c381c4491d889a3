//! Public location API
//!
//! [`Geolocator`] is the façade callers use; [`ConnectionManager`] wraps the
//! push-location service underneath it.

pub mod connection;
pub mod geolocator;
pub mod types;

pub use connection::{ConnectionManager, ConnectionState};
pub use geolocator::{Geolocator, PlatformServices};
pub use types::{
    CancellationToken, ErrorCallback, GeoResult, GeolocatorError, LastKnownPosition,
    PositionCallback, PositionError, PositionEvent, SubscriptionHandle, Timeout,
};
