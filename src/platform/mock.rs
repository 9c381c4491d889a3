//! In-memory platform implementations for testing and simulation
//!
//! Every mock is a cloneable handle over shared state: hand one clone to the
//! geolocator and keep another to drive deliveries and inspect calls.

use crate::platform::{
    LocationRequest, Permission, PermissionService, PermissionStatus, PlatformError,
    PlatformResult, ProviderRegistry, PushLocationService, RawLocation, ServiceEvent, ServiceSink,
    SettingsResolver, SettingsStatus,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct PermissionState {
    status: PermissionStatus,
    answer: PermissionStatus,
    requests: u32,
}

/// Permission subsystem answering prompts with a preset decision
#[derive(Debug, Clone)]
pub struct MockPermissions {
    state: Arc<Mutex<PermissionState>>,
}

impl MockPermissions {
    /// Status `status` before prompting, `answer` once prompted
    pub fn new(status: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(PermissionState {
                status,
                answer,
                requests: 0,
            })),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, PermissionStatus::Denied)
    }

    /// Not decided yet; the user grants on prompt
    pub fn grant_on_request() -> Self {
        Self::new(PermissionStatus::Unknown, PermissionStatus::Granted)
    }

    pub fn set_status(&self, status: PermissionStatus) {
        lock(&self.state).status = status;
    }

    /// Number of prompts shown so far
    pub fn request_count(&self) -> u32 {
        lock(&self.state).requests
    }
}

impl PermissionService for MockPermissions {
    fn check_status(&self, _permission: Permission) -> PermissionStatus {
        lock(&self.state).status
    }

    fn request(&self, permissions: &[Permission]) -> HashMap<Permission, PermissionStatus> {
        let mut state = lock(&self.state);
        state.requests += 1;
        state.status = state.answer;

        permissions.iter().map(|p| (*p, state.answer)).collect()
    }
}

/// Provider registry backed by a name -> enabled map
#[derive(Debug, Clone, Default)]
pub struct MockProviders {
    providers: Arc<Mutex<BTreeMap<String, bool>>>,
}

impl MockProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the usual gps, network and passive providers, all enabled
    pub fn standard() -> Self {
        let registry = Self::new();
        registry.set_provider("gps", true);
        registry.set_provider("network", true);
        registry.set_provider("passive", true);
        registry
    }

    pub fn set_provider(&self, name: &str, enabled: bool) {
        lock(&self.providers).insert(name.to_string(), enabled);
    }

    pub fn remove_provider(&self, name: &str) {
        lock(&self.providers).remove(name);
    }
}

impl ProviderRegistry for MockProviders {
    fn providers(&self, enabled_only: bool) -> Vec<String> {
        lock(&self.providers)
            .iter()
            .filter(|(_, enabled)| !enabled_only || **enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn is_provider_enabled(&self, provider: &str) -> bool {
        lock(&self.providers).get(provider).copied().unwrap_or(false)
    }
}

#[derive(Debug)]
struct ServiceState {
    connected: bool,
    auto_connect: bool,
    connect_error: Option<i32>,
    sink: Option<ServiceSink>,
    settings_status: SettingsStatus,
    last_location: Option<RawLocation>,
    requests: Vec<LocationRequest>,
    connect_calls: u32,
    disconnect_calls: u32,
    settings_checks: u32,
}

/// Push-location service that delivers whatever the test feeds it
#[derive(Debug, Clone)]
pub struct MockLocationService {
    state: Arc<Mutex<ServiceState>>,
}

impl MockLocationService {
    /// Service that connects immediately and whose settings are satisfied
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                connected: false,
                auto_connect: true,
                connect_error: None,
                sink: None,
                settings_status: SettingsStatus::Satisfied,
                last_location: None,
                requests: Vec::new(),
                connect_calls: 0,
                disconnect_calls: 0,
                settings_checks: 0,
            })),
        }
    }

    pub fn with_settings_status(self, status: SettingsStatus) -> Self {
        lock(&self.state).settings_status = status;
        self
    }

    pub fn with_last_location(self, location: RawLocation) -> Self {
        lock(&self.state).last_location = Some(location);
        self
    }

    /// Leave connections pending until `complete_connection` is called
    pub fn with_manual_connect(self) -> Self {
        lock(&self.state).auto_connect = false;
        self
    }

    /// Refuse `connect` synchronously with `code`
    pub fn with_connect_error(self, code: i32) -> Self {
        lock(&self.state).connect_error = Some(code);
        self
    }

    pub fn set_last_location(&self, location: Option<RawLocation>) {
        lock(&self.state).last_location = location;
    }

    /// Report a finished connection on the latest sink
    pub fn complete_connection(&self) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.connected = true;
        Self::emit(&state, ServiceEvent::Connected)
    }

    /// Deliver a fix to the latest sink, including one left over from a
    /// disconnected session. Also becomes the cached last location.
    pub fn deliver(&self, location: RawLocation) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.last_location = Some(location.clone());
        Self::emit(&state, ServiceEvent::LocationChanged(location))
    }

    pub fn fail_connection(&self, code: i32) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.connected = false;
        Self::emit(&state, ServiceEvent::ConnectionFailed { code })
    }

    pub fn suspend(&self, cause: i32) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.connected = false;
        Self::emit(&state, ServiceEvent::ConnectionSuspended { cause })
    }

    /// Update requests received so far
    pub fn requests(&self) -> Vec<LocationRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn connect_calls(&self) -> u32 {
        lock(&self.state).connect_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        lock(&self.state).disconnect_calls
    }

    pub fn settings_checks(&self) -> u32 {
        lock(&self.state).settings_checks
    }

    fn emit(state: &ServiceState, event: ServiceEvent) -> PlatformResult<()> {
        match &state.sink {
            Some(sink) => sink.send(event),
            None => Err(PlatformError::NotConnected),
        }
    }
}

impl Default for MockLocationService {
    fn default() -> Self {
        Self::new()
    }
}

impl PushLocationService for MockLocationService {
    fn connect(&mut self, sink: ServiceSink) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.connect_calls += 1;
        if let Some(code) = state.connect_error {
            return Err(PlatformError::ConnectionFailed { code });
        }
        state.sink = Some(sink);

        if state.auto_connect {
            state.connected = true;
            Self::emit(&state, ServiceEvent::Connected)?;
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut state = lock(&self.state);
        state.disconnect_calls += 1;
        state.connected = false;
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    fn request_updates(&mut self, request: &LocationRequest) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(PlatformError::NotConnected);
        }
        state.requests.push(request.clone());
        Ok(())
    }

    fn last_location(&self) -> Option<RawLocation> {
        lock(&self.state).last_location.clone()
    }

    fn check_settings(&mut self, _request: &LocationRequest, sink: ServiceSink) {
        let mut state = lock(&self.state);
        state.settings_checks += 1;
        let _ = sink.send(ServiceEvent::SettingsChecked(state.settings_status));
    }
}

/// Settings dialog launcher recording every request code it sees
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    launched: Arc<Mutex<Vec<i32>>>,
    fail: bool,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver whose dialog cannot be shown
    pub fn failing() -> Self {
        Self {
            launched: Arc::default(),
            fail: true,
        }
    }

    pub fn launched(&self) -> Vec<i32> {
        lock(&self.launched).clone()
    }
}

impl SettingsResolver for MockResolver {
    fn start_resolution(&self, request_code: i32) -> PlatformResult<()> {
        if self.fail {
            return Err(PlatformError::ResolutionFailed {
                reason: "no foreground activity".to_string(),
            });
        }
        lock(&self.launched).push(request_code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_prompt_updates_status() {
        let permissions = MockPermissions::grant_on_request();
        assert_eq!(permissions.check_status(Permission::Location), PermissionStatus::Unknown);

        let answer = permissions.request(&[Permission::Location]);
        assert_eq!(answer[&Permission::Location], PermissionStatus::Granted);
        assert_eq!(permissions.check_status(Permission::Location), PermissionStatus::Granted);
        assert_eq!(permissions.request_count(), 1);
    }

    #[test]
    fn test_provider_filtering() {
        let providers = MockProviders::standard();
        providers.set_provider("gps", false);

        assert_eq!(providers.providers(false).len(), 3);
        assert_eq!(providers.providers(true), vec!["network".to_string(), "passive".to_string()]);
        assert!(!providers.is_provider_enabled("gps"));
        assert!(!providers.is_provider_enabled("unknown"));
    }

    #[test]
    fn test_service_connect_and_deliver() {
        let mut service = MockLocationService::new();
        let (sink, rx) = ServiceSink::channel();

        service.connect(sink).unwrap();
        assert!(service.is_connected());
        assert_eq!(rx.try_recv().unwrap().event, ServiceEvent::Connected);

        service.deliver(RawLocation::new(1.0, 2.0)).unwrap();
        assert!(matches!(
            rx.try_recv().unwrap().event,
            ServiceEvent::LocationChanged(_)
        ));
        assert_eq!(service.last_location(), Some(RawLocation::new(1.0, 2.0)));
    }

    #[test]
    fn test_request_updates_requires_connection() {
        let mut service = MockLocationService::new().with_manual_connect();
        let (sink, _rx) = ServiceSink::channel();
        service.connect(sink).unwrap();

        let result = service.request_updates(&LocationRequest::default());
        assert_eq!(result, Err(PlatformError::NotConnected));

        service.complete_connection().unwrap();
        assert!(service.request_updates(&LocationRequest::default()).is_ok());
        assert_eq!(service.requests().len(), 1);
    }

    #[test]
    fn test_deliver_without_sink() {
        let service = MockLocationService::new();
        assert_eq!(
            service.deliver(RawLocation::new(0.0, 0.0)),
            Err(PlatformError::NotConnected)
        );
    }

    #[test]
    fn test_failing_resolver() {
        let resolver = MockResolver::failing();
        assert!(resolver.start_resolution(11000).is_err());
        assert!(resolver.launched().is_empty());
    }
}
