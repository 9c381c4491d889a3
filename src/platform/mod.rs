//! Platform collaborator seams
//!
//! The geolocator never talks to the operating system directly. Permission
//! checks, provider enumeration, the push-location service and the settings
//! dialog are reached through the traits in this module, so the same façade
//! runs against a real platform binding or the in-memory mocks.

pub mod permissions;
pub mod providers;
pub mod service;
pub mod mock;
pub mod error;

pub use permissions::{Permission, PermissionService, PermissionStatus};
pub use providers::ProviderRegistry;
pub use service::{
    LocationRequest, Priority, PushLocationService, ServiceEvent, ServiceSink, SettingsResolver,
    SettingsStatus,
};
pub use mock::{MockLocationService, MockPermissions, MockProviders, MockResolver};
pub use error::{PlatformError, PlatformResult};

/// Location record as reported by the push-location service
#[derive(Debug, Clone, PartialEq)]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    /// Direction of travel in degrees
    pub bearing: Option<f64>,
    pub accuracy: Option<f64>,
    /// Milliseconds since the Unix epoch, device clock
    pub time_ms: i64,
    pub provider: Option<String>,
}

impl RawLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            speed: None,
            bearing: None,
            accuracy: None,
            time_ms: 0,
            provider: None,
        }
    }

    pub fn with_time(mut self, time_ms: i64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}
