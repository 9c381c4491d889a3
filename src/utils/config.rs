//! Geolocator configuration
//!
//! Knobs for the fused update request and the settings handshake, kept apart
//! from the façade logic and loadable from a JSON file.

use crate::core::{
    ListenerSettings, PowerPreference, DEFAULT_DESIRED_ACCURACY_M, DEFAULT_FASTEST_INTERVAL_MS,
    DEFAULT_UPDATE_INTERVAL_MS, PASSIVE_PROVIDER, REQUEST_CHECK_SETTINGS,
};
use crate::platform::{LocationRequest, Priority};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration validation and file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize config: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocatorConfig {
    /// Update interval requested from the push service (ms)
    pub update_interval_ms: u64,
    /// Fastest delivery rate accepted (ms)
    pub fastest_interval_ms: u64,
    pub priority: Priority,
    /// Request code passed to the settings dialog
    pub settings_request_code: i32,
    /// Desired accuracy (meters)
    pub desired_accuracy_m: f64,
    /// Provider ids ignored when checking availability
    pub excluded_providers: Vec<String>,
}

impl Default for GeolocatorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MS,
            priority: Priority::HighAccuracy,
            settings_request_code: REQUEST_CHECK_SETTINGS,
            desired_accuracy_m: DEFAULT_DESIRED_ACCURACY_M,
            excluded_providers: vec![PASSIVE_PROVIDER.to_string()],
        }
    }
}

impl GeolocatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "update_interval_ms".to_string(),
                value: self.update_interval_ms.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.fastest_interval_ms > self.update_interval_ms {
            return Err(ConfigError::InvalidParameter {
                parameter: "fastest_interval_ms".to_string(),
                value: self.fastest_interval_ms.to_string(),
                reason: format!("must not exceed update_interval_ms ({})", self.update_interval_ms),
            });
        }
        if !(self.desired_accuracy_m.is_finite() && self.desired_accuracy_m > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "desired_accuracy_m".to_string(),
                value: self.desired_accuracy_m.to_string(),
                reason: "must be a positive number of meters".to_string(),
            });
        }
        Ok(())
    }

    /// Request used for the settings handshake and plain listening
    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            interval_ms: self.update_interval_ms,
            fastest_interval_ms: self.fastest_interval_ms,
            priority: self.priority,
            smallest_displacement_m: 0.0,
        }
    }

    /// Request for a listening session. Non-zero listener values override
    /// the configured interval; a non-default power preference overrides the
    /// configured priority.
    pub fn listener_request(&self, settings: &ListenerSettings) -> LocationRequest {
        let mut request = self.location_request();

        if settings.min_update_interval_ms > 0 {
            request.interval_ms = settings.min_update_interval_ms;
            request.fastest_interval_ms = request.fastest_interval_ms.min(request.interval_ms);
        }
        request.smallest_displacement_m = settings.min_distance_m;
        if settings.power_preference != PowerPreference::default() {
            request.priority = settings.power_preference.into();
        }
        request
    }

    /// Load and validate configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source,
        })?;

        let config: GeolocatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;

        fs::write(&path, content).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("geolocator-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = GeolocatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings_request_code, 11000);
        assert_eq!(config.location_request(), LocationRequest::default());
        assert_eq!(config.excluded_providers, vec!["passive".to_string()]);
    }

    #[test]
    fn test_validation_rejects_bad_intervals() {
        let config = GeolocatorConfig {
            update_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter { .. })));

        let config = GeolocatorConfig {
            update_interval_ms: 100,
            fastest_interval_ms: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GeolocatorConfig {
            desired_accuracy_m: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listener_request_overrides() {
        let config = GeolocatorConfig::default();
        let settings = ListenerSettings {
            min_update_interval_ms: 100,
            min_distance_m: 25.0,
            power_preference: PowerPreference::LowPower,
            ..Default::default()
        };

        let request = config.listener_request(&settings);
        assert_eq!(request.interval_ms, 100);
        assert_eq!(request.fastest_interval_ms, 100);
        assert_eq!(request.smallest_displacement_m, 25.0);
        assert_eq!(request.priority, Priority::LowPower);

        let request = config.listener_request(&ListenerSettings::default());
        assert_eq!(request, config.location_request());
    }

    #[test]
    fn test_file_round_trip_with_partial_json() {
        let path = temp_path("partial");
        fs::write(&path, r#"{ "update_interval_ms": 5000, "desired_accuracy_m": 10.0 }"#).unwrap();

        let config = GeolocatorConfig::load_from_file(&path).unwrap();
        assert_eq!(config.update_interval_ms, 5000);
        assert_eq!(config.fastest_interval_ms, 250);
        assert_eq!(config.desired_accuracy_m, 10.0);

        config.save_to_file(&path).unwrap();
        assert_eq!(GeolocatorConfig::load_from_file(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let result = GeolocatorConfig::load_from_file(temp_path("does-not-exist"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = temp_path("invalid");
        fs::write(&path, r#"{ "update_interval_ms": 0 }"#).unwrap();
        assert!(matches!(
            GeolocatorConfig::load_from_file(&path),
            Err(ConfigError::InvalidParameter { .. })
        ));
        let _ = fs::remove_file(&path);
    }
}
