//! Adaptive sampling controller.
//!
//! Drives the read, evaluate, reschedule loop over a [`FixSource`]:
//!
//! ```text
//! source ──fix──► validity ──► detector ──candidate──► stay point store ──► geofence
//!    ▲                             │                                          │
//!    └────────── next offset ◄─────┴────────────── outcome ◄──────────────────┘
//! ```
//!
//! Every fix is fully evaluated and committed to the stores before the next
//! one is requested. Arrivals open visits and, in adaptive mode, start a
//! sliced sigmoid covering the stay predicted by the stay point's first
//! visit; departures close the open visit and return to base sampling.

mod config;
mod error;
mod state;

pub use config::{
    default_segments, ControllerConfig, DEFAULT_ACCURACY_THRESHOLD_M, DEFAULT_ALPHA,
    DEFAULT_BASE_INTERVAL_SECS, DEFAULT_FALLBACK_INTERVAL_SECS,
    DEFAULT_LATE_DEPARTURE_INTERVAL_SECS, DEFAULT_MIN_INTERVAL_SECS,
};
pub use error::ControllerError;
pub use state::{RunSummary, SamplingMode};

use chrono::Duration;

use crate::detector::{Detection, StayPointDetector};
use crate::geofence::WindowedGeoFencing;
use crate::model::{Fix, GeoFencingOutcome, LiveStayPoint, StayPoint, Visit};
use crate::sampling::SamplingCurveGenerator;
use crate::source::FixSource;
use crate::store::{StayPointStore, VisitStore};

/// Counters not derivable from the stores.
#[derive(Debug, Default)]
struct RunStats {
    fixes_requested: usize,
    distinct_fixes: usize,
    invalid_fixes: usize,
    arrivals: usize,
    departures: usize,
}

/// Infers stay points and visits from a fix source while choosing when to
/// sample next.
pub struct AdaptiveSamplingController<S: FixSource> {
    config: ControllerConfig,
    source: S,
    detector: StayPointDetector,
    geofence: WindowedGeoFencing,
    stay_points: StayPointStore,
    visits: VisitStore,
    mode: SamplingMode,
    valid_fixes: Vec<Fix>,
    live_stay_points: Vec<Detection>,
    stats: RunStats,
}

impl<S: FixSource> AdaptiveSamplingController<S> {
    /// Create a controller over a fix source.
    pub fn new(config: ControllerConfig, source: S) -> Result<Self, ControllerError> {
        config.validate()?;

        Ok(Self {
            detector: StayPointDetector::new(config.detector.clone()),
            geofence: WindowedGeoFencing::new(config.geofence.clone()),
            stay_points: StayPointStore::new(config.dedup_radius_m),
            visits: VisitStore::new(),
            mode: SamplingMode::Trajectory,
            valid_fixes: Vec::new(),
            live_stay_points: Vec::new(),
            stats: RunStats::default(),
            config,
            source,
        })
    }

    /// Register stay points known before the run.
    ///
    /// Each one gets its stay as a closed visit and is introduced to the
    /// geofence. Candidates that duplicate an already known stay point are
    /// skipped.
    pub fn preload_stay_points(&mut self, stay_points: Vec<LiveStayPoint>) {
        let total = stay_points.len();
        for stay_point in stay_points {
            if !self.register_candidate(stay_point, Vec::new()) {
                tracing::warn!("Preloaded stay point duplicates a known one, skipping");
            }
        }
        tracing::info!(
            preloaded = total,
            registered = self.stay_points.len(),
            "Stay points preloaded"
        );
    }

    /// Consume the source and return the run counters.
    ///
    /// Fails when the geofence reports a departure the visit store cannot
    /// match, or a stay curve cannot be built.
    pub fn run(&mut self) -> Result<RunSummary, ControllerError> {
        tracing::info!(
            adaptive = self.config.adaptive,
            base_interval_secs = self.config.base_interval_secs,
            first_fix = %self.source.first_fix().timestamp,
            last_fix = %self.source.last_fix().timestamp,
            "Starting sampling run"
        );

        let mut offset = 0;
        let mut previous: Option<Fix> = None;

        while let Some(fix) = self.source.fix_at_or_after(offset) {
            self.stats.fixes_requested += 1;
            if previous.as_ref() != Some(&fix) {
                self.stats.distinct_fixes += 1;
            }
            previous = Some(fix.clone());

            let outcome = self.evaluate_fix(fix)?;
            offset = self.next_offset(outcome.as_ref());
            tracing::trace!(offset, mode = %self.mode, "Next fix requested");
        }

        self.finalize();

        let summary = self.summary();
        tracing::info!(
            stay_points = summary.stay_points,
            visits = summary.visits,
            arrivals = summary.arrivals,
            departures = summary.departures,
            valid_fixes = summary.valid_fixes,
            invalid_fixes = summary.invalid_fixes,
            "Sampling run complete"
        );
        Ok(summary)
    }

    /// Counters for the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            fixes_requested: self.stats.fixes_requested,
            distinct_fixes: self.stats.distinct_fixes,
            valid_fixes: self.valid_fixes.len(),
            invalid_fixes: self.stats.invalid_fixes,
            stay_points: self.stay_points.len(),
            visits: self.visits.len(),
            arrivals: self.stats.arrivals,
            departures: self.stats.departures,
        }
    }

    /// Stay points inferred so far.
    pub fn stay_points(&self) -> &[StayPoint] {
        self.stay_points.get_all()
    }

    /// Visits inferred so far.
    pub fn visits(&self) -> &[Visit] {
        self.visits.get_all()
    }

    /// Valid fixes in the order they were analyzed.
    pub fn valid_fixes(&self) -> &[Fix] {
        &self.valid_fixes
    }

    /// Every stay point candidate, including duplicates and preloaded ones.
    pub fn live_stay_points(&self) -> &[Detection] {
        &self.live_stay_points
    }

    /// Current sampling mode.
    pub fn mode(&self) -> &SamplingMode {
        &self.mode
    }

    /// Get the active configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Get the fix source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one fix through validation, the detector and the geofence.
    fn evaluate_fix(&mut self, mut fix: Fix) -> Result<Option<GeoFencingOutcome>, ControllerError> {
        if fix.accuracy >= self.config.accuracy_threshold_m {
            fix.is_valid = false;
        }
        if !fix.is_valid {
            self.stats.invalid_fixes += 1;
            tracing::warn!(
                at = %fix.timestamp,
                accuracy = fix.accuracy,
                "Invalid fix, skipping analysis"
            );
            return Ok(None);
        }

        self.valid_fixes.push(fix.clone());

        if let Some(detection) = self.detector.analyze_location(fix.clone()) {
            let Detection { stay_point, fixes } = detection;
            self.register_candidate(stay_point, fixes);
        }

        let outcome = match self.geofence.analyze_location(fix) {
            Some(outcome) => outcome,
            None => return Ok(None),
        };
        self.apply_outcome(&outcome)?;
        Ok(Some(outcome))
    }

    /// Store a candidate; when it is new, record its stay and start
    /// geofencing it. Returns whether it was new.
    fn register_candidate(&mut self, candidate: LiveStayPoint, fixes: Vec<Fix>) -> bool {
        let added = self.stay_points.add(&candidate);
        if let Some(stay_point) = &added {
            self.visits
                .add(Visit::from_live_stay_point(stay_point.id, &candidate));
            self.geofence.introduce_new_stay_point(stay_point.clone());
        }

        self.live_stay_points.push(Detection {
            stay_point: candidate,
            fixes,
        });
        added.is_some()
    }

    fn apply_outcome(&mut self, outcome: &GeoFencingOutcome) -> Result<(), ControllerError> {
        match outcome {
            GeoFencingOutcome::NoChange { .. } => Ok(()),
            GeoFencingOutcome::Arriving {
                stay_point,
                event_fix,
                detection_fix,
            } => self.arrive(stay_point, event_fix, detection_fix),
            GeoFencingOutcome::Leaving {
                stay_point,
                event_fix,
                detection_fix,
            } => self.depart(stay_point, event_fix, detection_fix),
            GeoFencingOutcome::LeavingAndArriving {
                from,
                to,
                event_fix,
                detection_fix,
            } => {
                self.depart(from, event_fix, detection_fix)?;
                self.arrive(to, event_fix, detection_fix)
            }
        }
    }

    fn arrive(
        &mut self,
        stay_point: &StayPoint,
        event_fix: &Fix,
        detection_fix: &Fix,
    ) -> Result<(), ControllerError> {
        self.visits.add(Visit::opened(
            stay_point.id,
            event_fix.clone(),
            detection_fix.clone(),
        ));
        self.stay_points.record_visit(stay_point.id);
        self.stats.arrivals += 1;

        tracing::info!(
            stay_point = stay_point.id,
            arrival = %event_fix.timestamp,
            detected = %detection_fix.timestamp,
            "Arrived at stay point"
        );

        if !self.config.adaptive {
            return Ok(());
        }

        let predicted_secs = self
            .visits
            .first_for(stay_point.id)
            .ok_or(ControllerError::MissingOracleVisit {
                stay_point_id: stay_point.id,
            })?
            .stay_time_seconds();

        let now = detection_fix.timestamp;
        let curve = SamplingCurveGenerator::new(
            now,
            now + Duration::seconds(predicted_secs),
            self.config.stay_curve_kind(),
        )?;

        tracing::debug!(
            stay_point = stay_point.id,
            predicted_secs,
            schedules = curve.len(),
            "Stay curve started"
        );

        self.mode = SamplingMode::StayPoint {
            stay_point_id: stay_point.id,
            curve,
            cumulative_offset: 0,
        };
        Ok(())
    }

    fn depart(
        &mut self,
        stay_point: &StayPoint,
        event_fix: &Fix,
        detection_fix: &Fix,
    ) -> Result<(), ControllerError> {
        let visit = self
            .visits
            .close_open(stay_point.id, event_fix.clone(), detection_fix.clone())
            .ok_or(ControllerError::NoOpenVisit {
                stay_point_id: stay_point.id,
            })?;

        tracing::info!(
            stay_point = stay_point.id,
            visit = visit.id,
            departure = %event_fix.timestamp,
            stay_secs = visit.stay_time_seconds(),
            "Left stay point"
        );

        self.stats.departures += 1;
        self.mode = SamplingMode::Trajectory;
        Ok(())
    }

    /// Seconds until the next fix should be requested.
    ///
    /// Inside a stay point the next curve offset is turned into a delta from
    /// the offset reached so far. Deltas below the minimum interval are
    /// replaced by the fallback interval, so the result is always positive.
    pub(crate) fn next_offset(&mut self, outcome: Option<&GeoFencingOutcome>) -> i64 {
        if !self.config.adaptive || outcome.is_none() {
            return self.config.base_interval_secs;
        }

        match &mut self.mode {
            SamplingMode::Trajectory => self.config.base_interval_secs,
            SamplingMode::StayPoint {
                stay_point_id,
                curve,
                cumulative_offset,
            } => {
                let value = match curve.next_schedule() {
                    Some(value) => value as i64,
                    None => return self.config.late_departure_interval_secs,
                };

                let delta = value - *cumulative_offset;
                if delta < self.config.min_interval_secs {
                    tracing::debug!(
                        stay_point = *stay_point_id,
                        requested = delta,
                        fallback = self.config.fallback_interval_secs,
                        "Curve interval below minimum, using fallback"
                    );
                    *cumulative_offset += self.config.fallback_interval_secs;
                    self.config.fallback_interval_secs
                } else {
                    *cumulative_offset = value;
                    delta
                }
            }
        }
    }

    /// Flush the detector and close the visit left open by the stream end.
    fn finalize(&mut self) {
        if let Some(detection) = self.detector.analyze_last_part() {
            let Detection { stay_point, fixes } = detection;
            self.register_candidate(stay_point, fixes);
        }

        let last_fix = self.source.last_fix().clone();
        if let Some(visit) = self.visits.close_last_if_open(&last_fix) {
            tracing::info!(
                stay_point = visit.stay_point_id,
                visit = visit.id,
                departure = %last_fix.timestamp,
                "Closed visit left open at end of stream"
            );
            if self.valid_fixes.last() != Some(&last_fix) {
                self.valid_fixes.push(last_fix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixStream;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 4, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn stream(fixes: Vec<Fix>) -> FixStream {
        FixStream::new(fixes).unwrap()
    }

    fn dummy_outcome() -> GeoFencingOutcome {
        GeoFencingOutcome::NoChange {
            current: None,
            event_fix: Fix::new(19.0, -99.0, ts(0)),
            detection_fix: Fix::new(19.0, -99.0, ts(0)),
        }
    }

    fn adaptive_controller() -> AdaptiveSamplingController<FixStream> {
        let config = ControllerConfig::default().with_adaptive(true);
        AdaptiveSamplingController::new(config, stream(vec![Fix::new(19.0, -99.0, ts(0))]))
            .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ControllerConfig::default().with_fallback_interval(0);
        let result = AdaptiveSamplingController::new(config, stream(vec![Fix::new(19.0, -99.0, ts(0))]));
        assert!(matches!(result, Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_zero_min_interval_is_rejected() {
        let config = ControllerConfig::default()
            .with_adaptive(true)
            .with_min_interval(0);
        let result = AdaptiveSamplingController::new(config, stream(vec![Fix::new(19.0, -99.0, ts(0))]));
        assert!(matches!(result, Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_non_adaptive_always_uses_base_interval() {
        let config = ControllerConfig::default().with_base_interval(45);
        let mut controller =
            AdaptiveSamplingController::new(config, stream(vec![Fix::new(19.0, -99.0, ts(0))]))
                .unwrap();
        assert_eq!(controller.next_offset(None), 45);
        assert_eq!(controller.next_offset(Some(&dummy_outcome())), 45);
    }

    #[test]
    fn test_adaptive_without_outcome_uses_base_interval() {
        let mut controller = adaptive_controller();
        assert_eq!(controller.next_offset(None), 30);
        assert_eq!(controller.next_offset(Some(&dummy_outcome())), 30);
    }

    #[test]
    fn test_adaptive_follows_curve_then_late_departure() {
        let mut controller = adaptive_controller();
        controller.config.late_departure_interval_secs = 600;
        controller.mode = SamplingMode::StayPoint {
            stay_point_id: 1,
            curve: SamplingCurveGenerator::with_length(
                7200.0,
                controller.config.stay_curve_kind(),
            )
            .unwrap(),
            cumulative_offset: 0,
        };

        let outcome = dummy_outcome();
        let mut total = 0;
        loop {
            let offset = controller.next_offset(Some(&outcome));
            assert!(offset > 0);
            if offset == 600 {
                break;
            }
            assert!(offset >= controller.config.min_interval_secs);
            total += offset;
        }
        // Offsets add up to the end of the curve
        assert!(total > 7000 && total < 7200, "total {}", total);
        assert_eq!(controller.next_offset(Some(&outcome)), 600);
    }

    #[test]
    fn test_watchdog_clamps_first_and_later_pops() {
        let mut controller = adaptive_controller();
        // Zero-length prediction: every offset is 0
        controller.mode = SamplingMode::StayPoint {
            stay_point_id: 1,
            curve: SamplingCurveGenerator::with_length(0.0, controller.config.stay_curve_kind())
                .unwrap(),
            cumulative_offset: 0,
        };

        let outcome = dummy_outcome();
        assert_eq!(controller.next_offset(Some(&outcome)), 30);
        assert_eq!(controller.next_offset(Some(&outcome)), 30);
        match controller.mode() {
            SamplingMode::StayPoint {
                cumulative_offset, ..
            } => assert_eq!(*cumulative_offset, 60),
            other => panic!("unexpected mode {}", other),
        }
    }

    #[test]
    fn test_inaccurate_fix_is_invalid() {
        let fixes = vec![
            Fix::with_details(19.0, -99.0, ts(0), 2240.0, 10.0, 0.0),
            Fix::with_details(19.0, -99.0, ts(30), 2240.0, 300.0, 0.0),
            Fix::with_details(19.0, -99.0, ts(60), 2240.0, 10.0, 0.0),
        ];
        let mut controller =
            AdaptiveSamplingController::new(ControllerConfig::default(), stream(fixes)).unwrap();
        let summary = controller.run().unwrap();

        assert_eq!(summary.fixes_requested, 3);
        assert_eq!(summary.invalid_fixes, 1);
        assert_eq!(summary.valid_fixes, 2);
        assert!(controller.valid_fixes().iter().all(|f| f.accuracy < 250.0));
    }

    #[test]
    fn test_departure_without_open_visit_is_fatal() {
        let mut controller = adaptive_controller();
        let stay_point = StayPoint::new(1, 19.0, -99.0);
        let fix = Fix::new(19.0, -99.0, ts(0));

        let err = controller.depart(&stay_point, &fix, &fix).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::NoOpenVisit { stay_point_id: 1 }
        ));
    }

    #[test]
    fn test_arrival_uses_first_visit_as_prediction() {
        let mut controller = adaptive_controller();
        controller.preload_stay_points(vec![LiveStayPoint::new(
            19.0,
            -99.0,
            ts(0),
            ts(7200),
            10,
        )]);
        assert_eq!(controller.visits().len(), 1);

        let stay_point = controller.stay_points()[0].clone();
        let arrival = Fix::new(19.0, -99.0, ts(86_400));
        controller.arrive(&stay_point, &arrival, &arrival).unwrap();

        match controller.mode() {
            SamplingMode::StayPoint { curve, .. } => assert_eq!(curve.length_secs(), 7200.0),
            other => panic!("unexpected mode {}", other),
        }
        assert_eq!(controller.stay_points()[0].visit_count, 2);
        assert!(controller.visits()[1].is_open());
    }

    #[test]
    fn test_preload_skips_duplicates() {
        let mut controller = adaptive_controller();
        controller.preload_stay_points(vec![
            LiveStayPoint::new(19.0, -99.0, ts(0), ts(600), 10),
            LiveStayPoint::new(19.0005, -99.0, ts(700), ts(1200), 10),
        ]);
        assert_eq!(controller.stay_points().len(), 1);
        assert_eq!(controller.live_stay_points().len(), 2);
    }
}
