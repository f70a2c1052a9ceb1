//! Streaming stay point detection.
//!
//! The detector buffers fixes since the last reset and compares the first
//! buffered fix against the newest one. Once the subject has moved farther
//! than the distance threshold:
//!
//! - if the run also lasted longer than the time threshold, the whole buffer
//!   (including the newest fix) is averaged into a stay point candidate;
//! - otherwise the run is discarded ("moved too far too soon").
//!
//! Either way the buffer restarts from the newest fix. Comparing first
//! against last bounds the test to the run's total span instead of reacting
//! to jitter between adjacent fixes.

use chrono::Duration;

use crate::geodesic::GeoPoint;
use crate::model::{Fix, LiveStayPoint};

/// Default minimum dwell time (45 minutes).
pub const DEFAULT_TIME_THRESHOLD_SECS: i64 = 45 * 60;

/// Default maximum drift within a stay (meters).
pub const DEFAULT_DISTANCE_THRESHOLD_M: f64 = 500.0;

/// Configuration for [`StayPointDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// A run must last strictly longer than this to become a stay point.
    pub time_threshold: Duration,
    /// A run ends once the newest fix is strictly farther than this from the first.
    pub distance_threshold_m: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            time_threshold: Duration::seconds(DEFAULT_TIME_THRESHOLD_SECS),
            distance_threshold_m: DEFAULT_DISTANCE_THRESHOLD_M,
        }
    }
}

impl DetectorConfig {
    /// Create a configuration from seconds and meters.
    pub fn new(time_threshold_secs: i64, distance_threshold_m: f64) -> Self {
        Self {
            time_threshold: Duration::seconds(time_threshold_secs),
            distance_threshold_m,
        }
    }
}

/// A stay point candidate together with the fixes it was built from.
#[derive(Debug, Clone)]
pub struct Detection {
    pub stay_point: LiveStayPoint,
    pub fixes: Vec<Fix>,
}

/// Buffered first-vs-last stay point detector.
#[derive(Debug)]
pub struct StayPointDetector {
    config: DetectorConfig,
    buffer: Vec<Fix>,
}

impl StayPointDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
        }
    }

    /// Create a detector with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Get the active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Fixes buffered since the last reset.
    pub fn buffered(&self) -> &[Fix] {
        &self.buffer
    }

    /// Feed one fix.
    ///
    /// Returns a candidate when the run that just ended qualifies as a stay.
    pub fn analyze_location(&mut self, fix: Fix) -> Option<Detection> {
        self.buffer.push(fix);
        if self.buffer.len() == 1 {
            return None;
        }

        let first = &self.buffer[0];
        let last = &self.buffer[self.buffer.len() - 1];

        let distance = first.distance_to(last);
        if distance <= self.config.distance_threshold_m {
            return None;
        }

        let elapsed_ms = first.time_difference_ms(last);
        let detection = if elapsed_ms > self.config.time_threshold.num_milliseconds() {
            let fixes = std::mem::take(&mut self.buffer);
            LiveStayPoint::from_fixes(&fixes).map(|stay_point| {
                tracing::debug!(
                    latitude = stay_point.latitude,
                    longitude = stay_point.longitude,
                    fixes = fixes.len(),
                    elapsed_secs = elapsed_ms / 1000,
                    "Stay point candidate detected"
                );
                Detection { stay_point, fixes }
            })
        } else {
            tracing::trace!(
                distance_m = distance,
                elapsed_secs = elapsed_ms / 1000,
                "Run left the area too soon, discarding"
            );
            None
        };

        self.restart_from_last(detection.as_ref());
        detection
    }

    /// Flush the remaining buffer at end of stream.
    ///
    /// Emits a candidate from the whole buffer when it holds at least two
    /// fixes, without applying either threshold.
    pub fn analyze_last_part(&mut self) -> Option<Detection> {
        if self.buffer.len() < 2 {
            return None;
        }

        let fixes = std::mem::take(&mut self.buffer);
        let stay_point = LiveStayPoint::from_fixes(&fixes)?;
        tracing::debug!(
            latitude = stay_point.latitude,
            longitude = stay_point.longitude,
            fixes = fixes.len(),
            "Stay point candidate built from trailing fixes"
        );
        Some(Detection { stay_point, fixes })
    }

    /// Reset the buffer to hold only the newest fix.
    fn restart_from_last(&mut self, detection: Option<&Detection>) {
        let last = match detection {
            Some(d) => d.fixes.last().cloned(),
            None => self.buffer.pop(),
        };
        self.buffer.clear();
        if let Some(fix) = last {
            self.buffer.push(fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 4, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    /// ~0.01 degree of latitude is ~1.1 km.
    const FAR: f64 = 0.01;

    #[test]
    fn test_single_fix_never_emits() {
        let mut spd = StayPointDetector::with_defaults();
        assert!(spd.analyze_location(Fix::new(19.0, -99.0, ts(0))).is_none());
        assert_eq!(spd.buffered().len(), 1);
    }

    #[test]
    fn test_run_inside_threshold_never_emits() {
        let mut spd = StayPointDetector::with_defaults();
        for i in 0..200 {
            let jitter = if i % 2 == 0 { 0.0001 } else { -0.0001 };
            let fix = Fix::new(19.0 + jitter, -99.0, ts(i * 60));
            assert!(spd.analyze_location(fix).is_none());
        }
        assert_eq!(spd.buffered().len(), 200);
    }

    #[test]
    fn test_long_stay_then_move_emits_candidate() {
        let mut spd = StayPointDetector::new(DetectorConfig::new(45 * 60, 500.0));
        for i in 0..=50 {
            assert!(spd.analyze_location(Fix::new(19.0, -99.0, ts(i * 60))).is_none());
        }

        let leaving = Fix::new(19.0 + FAR, -99.0, ts(51 * 60));
        let detection = spd.analyze_location(leaving.clone()).unwrap();

        assert_eq!(detection.fixes.len(), 52);
        assert_eq!(detection.stay_point.fix_count, 52);
        assert_eq!(detection.stay_point.arrival_time, ts(0));
        assert_eq!(detection.stay_point.departure_time, ts(51 * 60));
        // The far fix takes part in the average
        assert!(detection.stay_point.latitude > 19.0);
        assert_eq!(spd.buffered(), &[leaving]);
    }

    #[test]
    fn test_short_run_is_discarded() {
        let mut spd = StayPointDetector::new(DetectorConfig::new(45 * 60, 500.0));
        for i in 0..10 {
            spd.analyze_location(Fix::new(19.0, -99.0, ts(i * 60)));
        }

        let moved = Fix::new(19.0 + FAR, -99.0, ts(10 * 60));
        assert!(spd.analyze_location(moved.clone()).is_none());
        assert_eq!(spd.buffered(), &[moved]);
    }

    #[test]
    fn test_time_threshold_is_strict() {
        let mut spd = StayPointDetector::new(DetectorConfig::new(600, 500.0));
        spd.analyze_location(Fix::new(19.0, -99.0, ts(0)));
        // Exactly at the threshold: discarded
        assert!(spd
            .analyze_location(Fix::new(19.0 + FAR, -99.0, ts(600)))
            .is_none());
    }

    #[test]
    fn test_analyze_last_part() {
        let mut spd = StayPointDetector::with_defaults();
        assert!(spd.analyze_last_part().is_none());

        spd.analyze_location(Fix::new(19.0, -99.0, ts(0)));
        assert!(spd.analyze_last_part().is_none());

        spd.analyze_location(Fix::new(19.0002, -99.0, ts(60)));
        let detection = spd.analyze_last_part().unwrap();
        assert_eq!(detection.fixes.len(), 2);
        assert!((detection.stay_point.latitude - 19.0001).abs() < 1e-9);
        assert!(spd.buffered().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.time_threshold, Duration::minutes(45));
        assert_eq!(config.distance_threshold_m, 500.0);
    }
}
