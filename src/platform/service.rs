//! Push-location service collaborator and its event channel

use crate::core::{PowerPreference, DEFAULT_FASTEST_INTERVAL_MS, DEFAULT_UPDATE_INTERVAL_MS};
use crate::platform::{PlatformError, PlatformResult, RawLocation};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

/// Accuracy priority of a location request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    HighAccuracy,
    BalancedPowerAccuracy,
    LowPower,
    NoPower,
}

impl From<PowerPreference> for Priority {
    fn from(preference: PowerPreference) -> Self {
        match preference {
            PowerPreference::HighAccuracy => Priority::HighAccuracy,
            PowerPreference::Balanced => Priority::BalancedPowerAccuracy,
            PowerPreference::LowPower => Priority::LowPower,
            PowerPreference::Passive => Priority::NoPower,
        }
    }
}

/// Update request handed to the push-location service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Desired interval between updates (ms)
    pub interval_ms: u64,
    /// Upper bound on the delivery rate (ms)
    pub fastest_interval_ms: u64,
    pub priority: Priority,
    /// Minimum displacement between updates (meters)
    pub smallest_displacement_m: f64,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MS,
            priority: Priority::HighAccuracy,
            smallest_displacement_m: 0.0,
        }
    }
}

/// Outcome of checking device settings against a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsStatus {
    Satisfied,
    /// Not satisfied, but the user can fix it through a system dialog
    ResolutionRequired,
    /// Not satisfied and no way to fix it
    Unavailable,
}

/// Everything the push-location service reports back asynchronously
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    Connected,
    ConnectionFailed { code: i32 },
    ConnectionSuspended { cause: i32 },
    LocationChanged(RawLocation),
    SettingsChecked(SettingsStatus),
}

/// Service event tagged with the connection session it belongs to
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionEvent {
    pub session: u64,
    pub event: ServiceEvent,
}

/// Sending half of the event channel, handed to the service.
/// Cheap to clone and safe to use from the service's delivery thread.
#[derive(Debug, Clone)]
pub struct ServiceSink {
    session: u64,
    tx: Sender<SessionEvent>,
}

impl ServiceSink {
    pub(crate) fn channel() -> (ServiceSink, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        (ServiceSink { session: 0, tx }, rx)
    }

    /// Sink for a new connection session sharing the same channel
    pub(crate) fn for_session(&self, session: u64) -> ServiceSink {
        ServiceSink {
            session,
            tx: self.tx.clone(),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn send(&self, event: ServiceEvent) -> PlatformResult<()> {
        self.tx
            .send(SessionEvent {
                session: self.session,
                event,
            })
            .map_err(|_| PlatformError::ChannelClosed)
    }
}

/// Vendor push-based fused location service
pub trait PushLocationService: Send {
    /// Start connecting. Completion arrives later as
    /// `ServiceEvent::Connected` or `ServiceEvent::ConnectionFailed`.
    fn connect(&mut self, sink: ServiceSink) -> PlatformResult<()>;

    /// Disconnect; any update subscription ends with it
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Subscribe the connected sink to location updates
    fn request_updates(&mut self, request: &LocationRequest) -> PlatformResult<()>;

    /// Most recent fix the service has cached, never waits for a new one
    fn last_location(&self) -> Option<RawLocation>;

    /// Check device settings against `request`; the outcome arrives as
    /// `ServiceEvent::SettingsChecked`
    fn check_settings(&mut self, request: &LocationRequest, sink: ServiceSink);
}

/// UI collaborator able to show the system settings dialog
pub trait SettingsResolver: Send {
    /// Launch the resolution dialog. Its result is delivered out of band.
    fn start_resolution(&self, request_code: i32) -> PlatformResult<()>;
}
