//! Connection to the push-location service
//!
//! `ConnectionManager` owns the service handle and the receiving end of its
//! event channel. It drives the connect/disconnect lifecycle, performs the
//! one-time settings handshake, and turns raw service events into
//! [`PositionEvent`]s for the façade to dispatch.

use crate::api::types::{PositionError, PositionEvent};
use crate::core::Position;
use crate::platform::service::SessionEvent;
use crate::platform::{
    LocationRequest, PlatformError, PlatformResult, PushLocationService, RawLocation,
    ServiceEvent, ServiceSink, SettingsResolver, SettingsStatus,
};
use crate::utils::GeolocatorConfig;
use chrono::{TimeZone, Utc};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Lifecycle of the push-location connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Device settings do not satisfy the update request
    SettingsUnresolved,
}

impl<'a> TryFrom<&'a RawLocation> for Position {
    type Error = PlatformError;

    /// Field-by-field copy; bearing becomes heading and the device epoch
    /// milliseconds become a UTC instant.
    fn try_from(raw: &'a RawLocation) -> PlatformResult<Self> {
        let timestamp = Utc
            .timestamp_millis_opt(raw.time_ms)
            .single()
            .ok_or(PlatformError::InvalidTimestamp { time_ms: raw.time_ms })?;

        let position = Position::new(raw.latitude, raw.longitude, timestamp)?
            .with_altitude(raw.altitude)
            .with_speed(raw.speed)
            .with_accuracy(raw.accuracy)
            .with_heading(raw.bearing)?;
        Ok(position)
    }
}

pub struct ConnectionManager {
    service: Box<dyn PushLocationService>,
    resolver: Box<dyn SettingsResolver>,
    /// Session 0 sink, cloned per connection session
    sink: ServiceSink,
    events: Receiver<SessionEvent>,
    state: ConnectionState,
    /// Number of the latest `on_start`
    session: u64,
    active: bool,
    request: LocationRequest,
    settings_request_code: i32,
    settings_status: Option<SettingsStatus>,
}

impl ConnectionManager {
    /// Create the manager and start the settings handshake for the
    /// configured request. The handshake runs once, here.
    pub fn new(
        mut service: Box<dyn PushLocationService>,
        resolver: Box<dyn SettingsResolver>,
        config: &GeolocatorConfig,
    ) -> Self {
        let (sink, events) = ServiceSink::channel();
        let request = config.location_request();
        service.check_settings(&request, sink.clone());

        Self {
            service,
            resolver,
            sink,
            events,
            state: ConnectionState::Disconnected,
            session: 0,
            active: false,
            request,
            settings_request_code: config.settings_request_code,
            settings_status: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Outcome of the settings handshake, once it has arrived
    pub fn settings_status(&self) -> Option<SettingsStatus> {
        self.settings_status
    }

    /// Whether a session started by `on_start` is still open
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Request sent on the next successful connection
    pub fn request(&self) -> &LocationRequest {
        &self.request
    }

    /// Begin connecting with `request`. Completion is reported later
    /// through the event channel.
    pub fn on_start(&mut self, request: LocationRequest) -> PlatformResult<()> {
        self.session += 1;
        self.request = request;
        self.state = ConnectionState::Connecting;
        debug!(session = self.session, "connecting to location service");

        if let Err(e) = self.service.connect(self.sink.for_session(self.session)) {
            self.state = ConnectionState::Disconnected;
            return Err(e);
        }
        self.active = true;
        Ok(())
    }

    /// Disconnect. The service drops the update subscription with it and
    /// anything still queued for this session is discarded.
    pub fn on_stop(&mut self) {
        if self.active || self.service.is_connected() {
            self.service.disconnect();
            debug!(session = self.session, "disconnected from location service");
        }
        self.active = false;
        if self.state != ConnectionState::SettingsUnresolved {
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Cached last fix from the service. Never waits for a new one.
    /// A cached fix that cannot be translated counts as no fix.
    pub fn get_position(&self) -> Option<Position> {
        let raw = self.service.last_location()?;
        match Position::try_from(&raw) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!(error = %e, provider = ?raw.provider, "ignoring untranslatable cached location");
                None
            }
        }
    }

    /// Drain pending service events without blocking
    pub fn pump(&mut self) -> Vec<PositionEvent> {
        let mut out = Vec::new();
        while let Ok(envelope) = self.events.try_recv() {
            self.handle(envelope, &mut out);
        }
        out
    }

    /// Wait up to `timeout` for at least one position event, then drain
    /// whatever else is pending.
    pub fn wait(&mut self, timeout: Duration) -> Vec<PositionEvent> {
        // no representable deadline means wait until something arrives
        let deadline = Instant::now().checked_add(timeout);
        let mut out = Vec::new();

        while out.is_empty() {
            let received = match deadline {
                Some(deadline) => self
                    .events
                    .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    .ok(),
                None => self.events.recv().ok(),
            };
            match received {
                Some(envelope) => self.handle(envelope, &mut out),
                None => break,
            }
        }

        out.extend(self.pump());
        out
    }

    fn handle(&mut self, envelope: SessionEvent, out: &mut Vec<PositionEvent>) {
        let SessionEvent { session, event } = envelope;

        if let ServiceEvent::SettingsChecked(status) = event {
            self.on_settings_checked(status);
            return;
        }

        if !self.active || session != self.session {
            trace!(session, current = self.session, "dropping stale service event");
            return;
        }

        match event {
            ServiceEvent::Connected => {
                self.state = ConnectionState::Connected;
                debug!(session, "location service connected");

                if let Err(e) = self.service.request_updates(&self.request) {
                    warn!(error = %e, "failed to request location updates");
                    out.push(PositionEvent::Error(PositionError::UpdateRequestFailed {
                        reason: e.to_string(),
                    }));
                }
            }
            ServiceEvent::ConnectionFailed { code } => {
                self.state = ConnectionState::Disconnected;
                warn!(code, "location service connection failed");
                out.push(PositionEvent::Error(PositionError::ConnectionFailed { code }));
            }
            ServiceEvent::ConnectionSuspended { cause } => {
                self.state = ConnectionState::Disconnected;
                warn!(cause, "location service connection suspended");
                out.push(PositionEvent::Error(PositionError::ConnectionSuspended { cause }));
            }
            ServiceEvent::LocationChanged(raw) => match Position::try_from(&raw) {
                Ok(position) => {
                    trace!(provider = ?raw.provider, time_ms = raw.time_ms, "location update");
                    out.push(PositionEvent::Changed(position));
                }
                Err(e) => {
                    warn!(error = %e, provider = ?raw.provider, "skipping untranslatable location")
                }
            },
            ServiceEvent::SettingsChecked(_) => {}
        }
    }

    fn on_settings_checked(&mut self, status: SettingsStatus) {
        self.settings_status = Some(status);

        match status {
            SettingsStatus::Satisfied => {
                debug!("location settings satisfied");
            }
            SettingsStatus::ResolutionRequired => {
                self.state = ConnectionState::SettingsUnresolved;
                info!(
                    request_code = self.settings_request_code,
                    "location settings need user resolution"
                );
                if let Err(e) = self.resolver.start_resolution(self.settings_request_code) {
                    debug!(error = %e, "settings resolution dialog not shown");
                }
            }
            SettingsStatus::Unavailable => {
                self.state = ConnectionState::SettingsUnresolved;
                debug!("location settings cannot be resolved, continuing with degraded accuracy");
            }
        }
    }
}
