//! GPS fix type.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geodesic::GeoPoint;

/// Timestamp format used when rendering fixes and results.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One timestamped GPS observation.
///
/// A fix whose latitude, longitude, accuracy, speed and altitude are all
/// exactly zero is a sentinel for a synthetic or missing reading and is
/// created with `is_valid == false`. The sampling controller may also
/// invalidate fixes whose accuracy is too coarse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the fix was collected.
    pub timestamp: NaiveDateTime,
    /// Altitude in meters.
    pub altitude: f64,
    /// Horizontal accuracy radius in meters (0 when unknown).
    pub accuracy: f64,
    /// Speed in m/s.
    pub speed: f64,
    /// Battery level when the fix was collected.
    pub battery_level: f64,
    /// Activity identified when the fix was collected.
    pub detected_activity: i32,
    /// Whether the fix carries a real reading.
    pub is_valid: bool,
}

impl Fix {
    /// Create a fix with only a position and a timestamp.
    pub fn new(latitude: f64, longitude: f64, timestamp: NaiveDateTime) -> Self {
        Self::with_details(latitude, longitude, timestamp, 0.0, 0.0, 0.0)
    }

    /// Create a fix with altitude, accuracy and speed.
    pub fn with_details(
        latitude: f64,
        longitude: f64,
        timestamp: NaiveDateTime,
        altitude: f64,
        accuracy: f64,
        speed: f64,
    ) -> Self {
        let is_valid = !(latitude == 0.0
            && longitude == 0.0
            && accuracy == 0.0
            && speed == 0.0
            && altitude == 0.0);

        Self {
            latitude,
            longitude,
            timestamp,
            altitude,
            accuracy,
            speed,
            battery_level: 0.0,
            detected_activity: 0,
            is_valid,
        }
    }

    /// Set the battery level.
    pub fn with_battery_level(mut self, battery_level: f64) -> Self {
        self.battery_level = battery_level;
        self
    }

    /// Set the detected activity.
    pub fn with_detected_activity(mut self, activity: i32) -> Self {
        self.detected_activity = activity;
        self
    }

    /// Copy of this fix stamped with a different timestamp.
    ///
    /// Used to report the last known position at a requested time when no
    /// reading exists at exactly that time.
    pub fn at_time(&self, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Absolute time difference to another fix, in milliseconds.
    pub fn time_difference_ms(&self, other: &Fix) -> i64 {
        (self.timestamp - other.timestamp).num_milliseconds().abs()
    }
}

impl GeoPoint for Fix {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Two fixes are the same reading when position and time match.
impl PartialEq for Fix {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.timestamp == other.timestamp
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.latitude,
            self.longitude,
            self.timestamp.format(DISPLAY_TIME_FORMAT)
        )
    }
}
