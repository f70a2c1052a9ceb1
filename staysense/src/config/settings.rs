//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::controller::{
    default_segments, ControllerConfig, DEFAULT_ACCURACY_THRESHOLD_M, DEFAULT_ALPHA,
    DEFAULT_BASE_INTERVAL_SECS, DEFAULT_FALLBACK_INTERVAL_SECS,
    DEFAULT_LATE_DEPARTURE_INTERVAL_SECS, DEFAULT_MIN_INTERVAL_SECS,
};
use crate::detector::{DetectorConfig, DEFAULT_DISTANCE_THRESHOLD_M, DEFAULT_TIME_THRESHOLD_SECS};
use crate::geofence::{GeoFenceConfig, DEFAULT_RADIUS_M, DEFAULT_WINDOW_SIZE};
use crate::sampling::CurveSegment;
use crate::store::DEFAULT_DEDUP_RADIUS_M;

use super::file::config_directory;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// Stay point detection thresholds
    pub detector: DetectorSettings,
    /// Geofence settings
    pub geofence: GeoFenceSettings,
    /// Sampling controller settings
    pub sampling: SamplingSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[detector]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Minimum stay duration in seconds
    pub time_threshold: i64,
    /// Maximum roaming distance in meters
    pub distance_threshold: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            time_threshold: DEFAULT_TIME_THRESHOLD_SECS,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD_M,
        }
    }
}

/// `[geofence]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFenceSettings {
    /// Geofence radius in meters
    pub radius: f64,
    /// Voting window size (odd)
    pub window_size: usize,
}

impl Default for GeoFenceSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS_M,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// `[sampling]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    pub adaptive: bool,
    pub base_interval: i64,
    pub late_departure_interval: i64,
    pub min_interval: i64,
    pub fallback_interval: i64,
    /// Accuracy radius (meters) at or above which fixes are discarded
    pub accuracy_threshold: f64,
    /// Stay point dedup radius in meters
    pub dedup_radius: f64,
    pub alpha: f64,
    pub segments: Vec<CurveSegment>,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            adaptive: false,
            base_interval: DEFAULT_BASE_INTERVAL_SECS,
            late_departure_interval: DEFAULT_LATE_DEPARTURE_INTERVAL_SECS,
            min_interval: DEFAULT_MIN_INTERVAL_SECS,
            fallback_interval: DEFAULT_FALLBACK_INTERVAL_SECS,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD_M,
            dedup_radius: DEFAULT_DEDUP_RADIUS_M,
            alpha: DEFAULT_ALPHA,
            segments: default_segments(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

/// Default log file (~/.staysense/staysense.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("staysense.log")
}

impl ConfigFile {
    /// Build the controller configuration these settings describe.
    ///
    /// Values are copied as-is; range checks happen in
    /// [`ControllerConfig::validate`].
    pub fn to_controller_config(&self) -> ControllerConfig {
        let sampling = &self.sampling;
        ControllerConfig {
            detector: DetectorConfig::new(
                self.detector.time_threshold,
                self.detector.distance_threshold,
            ),
            geofence: GeoFenceConfig {
                radius_m: self.geofence.radius,
                window_size: self.geofence.window_size,
            },
            dedup_radius_m: sampling.dedup_radius,
            adaptive: sampling.adaptive,
            base_interval_secs: sampling.base_interval,
            late_departure_interval_secs: sampling.late_departure_interval,
            min_interval_secs: sampling.min_interval,
            fallback_interval_secs: sampling.fallback_interval,
            accuracy_threshold_m: sampling.accuracy_threshold,
            alpha: sampling.alpha,
            segments: sampling.segments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_controller_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.to_controller_config(), ControllerConfig::default());
    }

    #[test]
    fn test_to_controller_config_copies_values() {
        let mut config = ConfigFile::default();
        config.detector.time_threshold = 600;
        config.geofence.radius = 80.0;
        config.sampling.adaptive = true;
        config.sampling.late_departure_interval = 600;
        config.sampling.segments = vec![CurveSegment::new(-3.0, 3.0, 60.0)];

        let controller = config.to_controller_config();

        assert_eq!(controller.detector.time_threshold, chrono::Duration::seconds(600));
        assert_eq!(controller.geofence.radius_m, 80.0);
        assert!(controller.adaptive);
        assert_eq!(controller.late_departure_interval_secs, 600);
        assert_eq!(controller.segments.len(), 1);
        assert!(controller.validate().is_ok());
    }

    #[test]
    fn test_default_log_file_in_config_directory() {
        assert!(default_log_file().ends_with(".staysense/staysense.log"));
    }
}
