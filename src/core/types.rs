//! Core data types for location fixes and listener configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected coordinate or heading value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {value}")]
pub struct InvalidPosition {
    pub field: &'static str,
    pub value: f64,
}

/// A single location fix in WGS84 coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, -90..=90
    pub latitude: f64,
    /// Longitude in degrees, -180..=180
    pub longitude: f64,
    /// Altitude above the WGS84 ellipsoid (meters)
    pub altitude: Option<f64>,
    /// Ground speed (m/s)
    pub speed: Option<f64>,
    /// Heading in degrees, 0..360
    pub heading: Option<f64>,
    /// Horizontal accuracy radius (meters)
    pub accuracy: Option<f64>,
    /// Time of the fix
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self, InvalidPosition> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidPosition { field: "latitude", value: latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidPosition { field: "longitude", value: longitude });
        }

        Ok(Self {
            latitude,
            longitude,
            altitude: None,
            speed: None,
            heading: None,
            accuracy: None,
            timestamp,
        })
    }

    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        self.speed = speed;
        self
    }

    /// Attach a heading, wrapped into 0..360. Non-finite values are rejected.
    pub fn with_heading(mut self, heading: Option<f64>) -> Result<Self, InvalidPosition> {
        self.heading = match heading {
            Some(h) if !h.is_finite() => {
                return Err(InvalidPosition { field: "heading", value: h });
            }
            Some(h) => Some(h.rem_euclid(360.0)),
            None => None,
        };
        Ok(self)
    }

    pub fn with_accuracy(mut self, accuracy: Option<f64>) -> Self {
        self.accuracy = accuracy;
        self
    }
}

/// Power/accuracy trade-off hint passed through to the location service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerPreference {
    /// Most precise fixes, GPS allowed
    #[default]
    HighAccuracy,
    /// City-block accuracy
    Balanced,
    /// City-level accuracy
    LowPower,
    /// Only fixes computed for other clients
    Passive,
}

/// Options for a continuous listening session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerSettings {
    /// Minimum time between updates (ms), 0 uses the configured interval
    pub min_update_interval_ms: u64,
    /// Minimum displacement between updates (meters)
    pub min_distance_m: f64,
    /// Whether heading was requested by the caller
    pub include_heading: bool,
    pub power_preference: PowerPreference,
    pub allow_background_updates: bool,
    pub pause_updates_automatically: bool,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            min_update_interval_ms: 0,
            min_distance_m: 0.0,
            include_heading: false,
            power_preference: PowerPreference::HighAccuracy,
            allow_background_updates: false,
            pause_updates_automatically: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(0).unwrap()
    }

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(90.0, 180.0, epoch()).is_ok());
        assert!(Position::new(-90.0, -180.0, epoch()).is_ok());

        let err = Position::new(90.5, 0.0, epoch()).unwrap_err();
        assert_eq!(err.field, "latitude");

        let err = Position::new(0.0, -180.1, epoch()).unwrap_err();
        assert_eq!(err.field, "longitude");

        assert!(Position::new(f64::NAN, 0.0, epoch()).is_err());
    }

    #[test]
    fn test_heading_wraps() {
        let pos = Position::new(1.0, 2.0, epoch())
            .unwrap()
            .with_heading(Some(370.0))
            .unwrap();
        assert_eq!(pos.heading, Some(10.0));

        let pos = Position::new(1.0, 2.0, epoch())
            .unwrap()
            .with_heading(Some(-90.0))
            .unwrap();
        assert_eq!(pos.heading, Some(270.0));

        let pos = Position::new(1.0, 2.0, epoch()).unwrap();
        assert!(pos.with_heading(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_position_equality_by_value() {
        let a = Position::new(37.422, -122.084, epoch()).unwrap().with_speed(Some(1.5));
        let b = Position::new(37.422, -122.084, epoch()).unwrap().with_speed(Some(1.5));
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_speed(None));
    }

    #[test]
    fn test_position_serializes_utc_timestamp() {
        let pos = Position::new(37.422, -122.084, Utc.timestamp_millis_opt(1000).unwrap()).unwrap();
        let json = serde_json::to_string(&pos).unwrap();
        assert!(json.contains("1970-01-01T00:00:01Z"));

        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
    }
}
