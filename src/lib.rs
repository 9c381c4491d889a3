//! Cross-platform geolocation façade
//!
//! A permission-gated location API over two platform services: the OS
//! provider registry and a push-based fused location service. Callers ask
//! for the last known fix or open a listening session; raw platform
//! locations are translated into [`Position`] values and dispatched to
//! registered callbacks.

pub mod core;
pub mod platform;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{ListenerSettings, Position, PowerPreference};
pub use platform::{
    LocationRequest, Permission, PermissionService, PermissionStatus, PlatformError,
    ProviderRegistry, PushLocationService, RawLocation, ServiceEvent, ServiceSink,
    SettingsResolver, SettingsStatus,
};
pub use api::{
    CancellationToken, ConnectionManager, ConnectionState, GeoResult, Geolocator,
    GeolocatorError, LastKnownPosition, PlatformServices, PositionError, SubscriptionHandle,
    Timeout,
};
pub use utils::{ConfigError, GeolocatorConfig};
