//! Fixed parameters of the fused location request and settings handshake

/// Default update interval requested from the push-location service (ms)
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1000;

/// Fastest rate at which the service may deliver updates (ms)
pub const DEFAULT_FASTEST_INTERVAL_MS: u64 = 250;

/// Request code handed to the UI collaborator when settings need resolving
pub const REQUEST_CHECK_SETTINGS: i32 = 11000;

/// Provider id that only piggybacks on fixes requested by others
pub const PASSIVE_PROVIDER: &str = "passive";

/// Default desired accuracy (meters)
pub const DEFAULT_DESIRED_ACCURACY_M: f64 = 100.0;
