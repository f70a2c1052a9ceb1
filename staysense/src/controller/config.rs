//! Controller configuration.

use crate::detector::DetectorConfig;
use crate::geofence::GeoFenceConfig;
use crate::sampling::{CurveKind, CurveSegment};
use crate::store::DEFAULT_DEDUP_RADIUS_M;

use super::ControllerError;

/// Default interval between fixes outside of stay points (seconds).
pub const DEFAULT_BASE_INTERVAL_SECS: i64 = 30;

/// Default interval once the predicted stay is over (seconds).
pub const DEFAULT_LATE_DEPARTURE_INTERVAL_SECS: i64 = 30;

/// Default smallest interval the curve may request (seconds).
pub const DEFAULT_MIN_INTERVAL_SECS: i64 = 30;

/// Default interval used when the curve asks for less than the minimum (seconds).
pub const DEFAULT_FALLBACK_INTERVAL_SECS: i64 = 30;

/// Default accuracy radius at or above which a fix is discarded (meters).
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 250.0;

/// Default sigmoid steepness.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Default sigmoid slices: coarse tails, fine center.
pub fn default_segments() -> Vec<CurveSegment> {
    vec![
        CurveSegment::new(-5.0, -2.0, 600.0),
        CurveSegment::new(-2.0, 2.0, 120.0),
        CurveSegment::new(2.0, 5.0, 600.0),
    ]
}

/// Configuration for the adaptive sampling controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Stay point detector thresholds.
    pub detector: DetectorConfig,

    /// Geofence radius and window.
    pub geofence: GeoFenceConfig,

    /// Candidates closer than this to a known stay point are dropped (meters).
    pub dedup_radius_m: f64,

    /// Adapt the sampling interval to the predicted stay.
    ///
    /// When false every request uses `base_interval_secs`.
    pub adaptive: bool,

    /// Interval outside of stay points, and whenever no outcome is available.
    pub base_interval_secs: i64,

    /// Interval once the stay curve is exhausted.
    ///
    /// The subject is expected to leave soon, so fine-grained sampling is
    /// no longer useful.
    pub late_departure_interval_secs: i64,

    /// Smallest interval the stay curve may request.
    pub min_interval_secs: i64,

    /// Interval used instead of any curve request below `min_interval_secs`.
    pub fallback_interval_secs: i64,

    /// Fixes with an accuracy radius at or above this are invalid (meters).
    pub accuracy_threshold_m: f64,

    /// Sigmoid steepness for stay curves.
    pub alpha: f64,

    /// Sigmoid slices for stay curves.
    pub segments: Vec<CurveSegment>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            geofence: GeoFenceConfig::default(),
            dedup_radius_m: DEFAULT_DEDUP_RADIUS_M,
            adaptive: false,
            base_interval_secs: DEFAULT_BASE_INTERVAL_SECS,
            late_departure_interval_secs: DEFAULT_LATE_DEPARTURE_INTERVAL_SECS,
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            fallback_interval_secs: DEFAULT_FALLBACK_INTERVAL_SECS,
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            alpha: DEFAULT_ALPHA,
            segments: default_segments(),
        }
    }
}

impl ControllerConfig {
    /// Set the detector thresholds.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Set the geofence radius and window.
    pub fn with_geofence(mut self, geofence: GeoFenceConfig) -> Self {
        self.geofence = geofence;
        self
    }

    /// Set the stay point dedup radius.
    pub fn with_dedup_radius(mut self, meters: f64) -> Self {
        self.dedup_radius_m = meters;
        self
    }

    /// Enable or disable adaptive sampling.
    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Set the base interval.
    pub fn with_base_interval(mut self, secs: i64) -> Self {
        self.base_interval_secs = secs;
        self
    }

    /// Set the late-departure interval.
    pub fn with_late_departure_interval(mut self, secs: i64) -> Self {
        self.late_departure_interval_secs = secs;
        self
    }

    /// Set the minimum curve interval.
    pub fn with_min_interval(mut self, secs: i64) -> Self {
        self.min_interval_secs = secs;
        self
    }

    /// Set the fallback interval.
    pub fn with_fallback_interval(mut self, secs: i64) -> Self {
        self.fallback_interval_secs = secs;
        self
    }

    /// Set the accuracy threshold.
    pub fn with_accuracy_threshold(mut self, meters: f64) -> Self {
        self.accuracy_threshold_m = meters;
        self
    }

    /// Set the sigmoid steepness.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the sigmoid slices.
    pub fn with_segments(mut self, segments: Vec<CurveSegment>) -> Self {
        self.segments = segments;
        self
    }

    /// Curve used for stay predictions.
    pub fn stay_curve_kind(&self) -> CurveKind {
        CurveKind::SlicedSigmoid {
            alpha: self.alpha,
            segments: self.segments.clone(),
        }
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), ControllerError> {
        let positive_intervals = [
            ("base interval", self.base_interval_secs),
            ("late-departure interval", self.late_departure_interval_secs),
            ("fallback interval", self.fallback_interval_secs),
        ];
        for (name, value) in positive_intervals {
            if value <= 0 {
                return Err(ControllerError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        // A zero delta would hand the same fix back to the geofence
        if self.min_interval_secs < 1 {
            return Err(ControllerError::Config(format!(
                "minimum interval must be at least 1 second, got {}",
                self.min_interval_secs
            )));
        }
        if self.geofence.window_size == 0 {
            return Err(ControllerError::Config(
                "geofence window size must be at least 1".to_string(),
            ));
        }
        if self.geofence.radius_m <= 0.0 {
            return Err(ControllerError::Config(format!(
                "geofence radius must be positive, got {}",
                self.geofence.radius_m
            )));
        }
        if self.detector.distance_threshold_m <= 0.0 {
            return Err(ControllerError::Config(format!(
                "detector distance threshold must be positive, got {}",
                self.detector.distance_threshold_m
            )));
        }
        if self.dedup_radius_m < 0.0 {
            return Err(ControllerError::Config(format!(
                "dedup radius must not be negative, got {}",
                self.dedup_radius_m
            )));
        }

        if self.adaptive {
            self.stay_curve_kind().validate()?;
        }
        Ok(())
    }
}
