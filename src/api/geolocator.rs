//! Permission-gated location façade
//!
//! `Geolocator` is the public entry point: availability queries, one-shot
//! position lookups, and a continuous listening session whose events are
//! dispatched to registered callbacks by [`Geolocator::process`].

use crate::api::connection::{ConnectionManager, ConnectionState};
use crate::api::types::{
    CancellationToken, ErrorCallback, GeoResult, GeolocatorError, LastKnownPosition,
    PositionCallback, PositionError, PositionEvent, SubscriptionHandle, Timeout,
};
use crate::core::{ListenerSettings, Position};
use crate::platform::{
    LocationRequest, Permission, PermissionService, PermissionStatus, ProviderRegistry,
    PushLocationService, SettingsResolver,
};
use crate::utils::GeolocatorConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The platform collaborators a geolocator is built on
pub struct PlatformServices {
    pub permissions: Box<dyn PermissionService>,
    pub providers: Box<dyn ProviderRegistry>,
    pub location: Box<dyn PushLocationService>,
    pub resolver: Box<dyn SettingsResolver>,
}

/// An open listening session
#[derive(Debug, Clone)]
struct ListenerSession {
    settings: ListenerSettings,
    request: LocationRequest,
}

pub struct Geolocator {
    permissions: Box<dyn PermissionService>,
    registry: Box<dyn ProviderRegistry>,
    connection: ConnectionManager,
    config: GeolocatorConfig,
    /// Provider ids from the last enumeration, exclusions removed
    providers: Vec<String>,
    desired_accuracy_m: f64,
    listener: Option<ListenerSession>,
    last_position: LastKnownPosition,
    callback_counter: u32,
    position_callbacks: BTreeMap<SubscriptionHandle, PositionCallback>,
    error_callbacks: BTreeMap<SubscriptionHandle, ErrorCallback>,
}

impl Geolocator {
    /// Create a geolocator over `platform`. Starts the settings handshake
    /// and takes the first provider snapshot.
    ///
    /// The handshake outcome, and with it any settings resolution prompt,
    /// is acted on by the first [`process`](Self::process) or
    /// [`process_timeout`](Self::process_timeout) call.
    pub fn new(platform: PlatformServices, config: GeolocatorConfig) -> GeoResult<Self> {
        config.validate()?;

        let connection = ConnectionManager::new(platform.location, platform.resolver, &config);
        let mut geolocator = Self {
            permissions: platform.permissions,
            registry: platform.providers,
            connection,
            desired_accuracy_m: config.desired_accuracy_m,
            config,
            providers: Vec::new(),
            listener: None,
            last_position: LastKnownPosition::default(),
            callback_counter: 0,
            position_callbacks: BTreeMap::new(),
            error_callbacks: BTreeMap::new(),
        };
        geolocator.refresh_providers();
        Ok(geolocator)
    }

    /// At least one location provider exists on the device
    pub fn is_geolocation_available(&self) -> bool {
        !self.providers.is_empty()
    }

    /// At least one known provider is currently enabled
    pub fn is_geolocation_enabled(&self) -> bool {
        self.providers
            .iter()
            .any(|p| self.registry.is_provider_enabled(p))
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn supports_heading(&self) -> bool {
        true
    }

    pub fn desired_accuracy(&self) -> f64 {
        self.desired_accuracy_m
    }

    pub fn set_desired_accuracy(&mut self, accuracy_m: f64) -> GeoResult<()> {
        if !(accuracy_m.is_finite() && accuracy_m > 0.0) {
            return Err(GeolocatorError::InvalidArgument {
                name: "accuracy_m",
                reason: format!("must be a positive number of meters, got {}", accuracy_m),
            });
        }
        self.desired_accuracy_m = accuracy_m;
        Ok(())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Settings of the open listening session, if any
    pub fn listener_settings(&self) -> Option<&ListenerSettings> {
        self.listener.as_ref().map(|session| &session.settings)
    }

    /// Update request of the open listening session, if any
    pub fn listener_request(&self) -> Option<&LocationRequest> {
        self.listener.as_ref().map(|session| &session.request)
    }

    /// Shared handle to the most recent dispatched fix
    pub fn last_known_position(&self) -> LastKnownPosition {
        self.last_position.clone()
    }

    /// Last fix cached by the location service.
    ///
    /// Does not wait for a new fix; `timeout` is accepted for API parity
    /// and has nothing to bound. Returns `Ok(None)` when permission is
    /// denied or no fix is cached, and `Cancelled` if `cancel` is signalled
    /// before the permission handshake completes.
    pub fn get_position(
        &mut self,
        timeout: Timeout,
        cancel: Option<&CancellationToken>,
    ) -> GeoResult<Option<Position>> {
        check_cancelled(cancel)?;

        if !self.ensure_permission() {
            return Ok(None);
        }
        check_cancelled(cancel)?;
        self.refresh_providers();

        debug!(?timeout, "returning last known location");
        Ok(self.connection.get_position())
    }

    /// Start a continuous listening session.
    ///
    /// Returns `Ok(false)` when location permission is denied.
    pub fn start_listening(
        &mut self,
        min_time_ms: i64,
        min_distance_m: f64,
        include_heading: bool,
        settings: Option<ListenerSettings>,
    ) -> GeoResult<bool> {
        if min_time_ms < 0 {
            return Err(GeolocatorError::InvalidArgument {
                name: "min_time_ms",
                reason: format!("must be non-negative, got {}", min_time_ms),
            });
        }
        if !(min_distance_m >= 0.0 && min_distance_m.is_finite()) {
            return Err(GeolocatorError::InvalidArgument {
                name: "min_distance_m",
                reason: format!("must be non-negative, got {}", min_distance_m),
            });
        }
        if self.is_listening() {
            return Err(GeolocatorError::InvalidOperation(
                "this geolocator is already listening".to_string(),
            ));
        }

        if !self.ensure_permission() {
            return Ok(false);
        }
        self.refresh_providers();

        let settings = ListenerSettings {
            min_update_interval_ms: min_time_ms as u64,
            min_distance_m,
            include_heading,
            ..settings.unwrap_or_default()
        };
        let request = self.config.listener_request(&settings);

        self.connection.on_start(request.clone())?;
        info!(
            interval_ms = request.interval_ms,
            min_distance_m,
            priority = ?request.priority,
            "started listening for location updates"
        );
        self.listener = Some(ListenerSession { settings, request });
        Ok(true)
    }

    /// Stop the listening session. Safe to call when not listening.
    pub fn stop_listening(&mut self) -> bool {
        self.connection.on_stop();
        if self.listener.take().is_some() {
            info!("stopped listening for location updates");
        }
        true
    }

    /// Register a callback for position updates
    pub fn on_position_changed(&mut self, callback: PositionCallback) -> SubscriptionHandle {
        let handle = self.next_handle();
        self.position_callbacks.insert(handle, callback);
        handle
    }

    /// Register a callback for position errors
    pub fn on_position_error(&mut self, callback: ErrorCallback) -> SubscriptionHandle {
        let handle = self.next_handle();
        self.error_callbacks.insert(handle, callback);
        handle
    }

    /// Remove a callback; false if the handle was unknown
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.position_callbacks.remove(&handle).is_some()
            || self.error_callbacks.remove(&handle).is_some()
    }

    /// Dispatch everything the location service has delivered so far.
    /// Returns the number of events handed to callbacks.
    pub fn process(&mut self) -> usize {
        let events = self.connection.pump();
        self.dispatch(events)
    }

    /// Like [`process`](Self::process), but waits up to `timeout` for the
    /// first event.
    pub fn process_timeout(&mut self, timeout: Duration) -> usize {
        let events = self.connection.wait(timeout);
        self.dispatch(events)
    }

    fn dispatch(&mut self, events: Vec<PositionEvent>) -> usize {
        let mut dispatched = 0;

        for event in events {
            if !self.is_listening() {
                debug!("ignoring location event delivered while not listening");
                continue;
            }

            match event {
                PositionEvent::Changed(position) => {
                    self.last_position.set(position.clone());
                    for callback in self.position_callbacks.values() {
                        callback(&position);
                    }
                }
                PositionEvent::Error(error) => self.raise_error(error),
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Errors end the session before subscribers hear about them
    fn raise_error(&mut self, error: PositionError) {
        warn!(%error, "location error while listening, stopping");
        self.stop_listening();

        for callback in self.error_callbacks.values() {
            callback(&error);
        }
    }

    /// Check the location permission, prompting once if needed
    fn ensure_permission(&mut self) -> bool {
        if self.permissions.check_status(Permission::Location) == PermissionStatus::Granted {
            return true;
        }

        debug!("no location permission yet, requesting it");
        let answer = self.permissions.request(&[Permission::Location]);
        if answer.get(&Permission::Location) != Some(&PermissionStatus::Granted) {
            warn!("location permission denied");
            return false;
        }
        true
    }

    fn refresh_providers(&mut self) {
        let excluded = &self.config.excluded_providers;
        self.providers = self
            .registry
            .providers(false)
            .into_iter()
            .filter(|p| !excluded.contains(p))
            .collect();
        debug!(providers = ?self.providers, "enumerated location providers");
    }

    fn next_handle(&mut self) -> SubscriptionHandle {
        self.callback_counter = self.callback_counter.wrapping_add(1);
        SubscriptionHandle::new(self.callback_counter)
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> GeoResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(GeolocatorError::Cancelled),
        _ => Ok(()),
    }
}
