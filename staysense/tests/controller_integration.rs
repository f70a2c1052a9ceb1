//! Integration tests for the adaptive sampling controller.
//!
//! These tests replay synthetic traces through the complete flow:
//! - fix source → detector → stay point store → geofence → visits
//! - stay curve scheduling after an arrival
//! - noisy dwells generated from a seeded RNG
//!
//! Run with: `cargo test --test controller_integration`

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use staysense::controller::{AdaptiveSamplingController, ControllerConfig};
use staysense::geodesic::distance;
use staysense::model::{Fix, LiveStayPoint};
use staysense::source::FixStream;

// ============================================================================
// Helper Functions
// ============================================================================

/// Default seconds between recorded fixes.
const RECORD_INTERVAL_SECS: i64 = 30;

/// Roughly 1.1 km of latitude.
const STEP_DEG: f64 = 0.01;

const HOME: (f64, f64) = (19.4326, -99.1332);
const WORK: (f64, f64) = (19.4326, -99.1232);

/// Builds a trace with one fix every `interval_secs` seconds.
struct TraceBuilder {
    fixes: Vec<Fix>,
    next: NaiveDateTime,
    interval_secs: i64,
    rng: StdRng,
    jitter_deg: f64,
}

impl TraceBuilder {
    fn new(seed: u64) -> Self {
        Self {
            fixes: Vec::new(),
            next: NaiveDate::from_ymd_opt(2017, 4, 3)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            interval_secs: RECORD_INTERVAL_SECS,
            rng: StdRng::seed_from_u64(seed),
            jitter_deg: 0.0,
        }
    }

    fn with_interval(mut self, secs: i64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Scatter dwell fixes by up to `deg` in each axis.
    fn with_jitter(mut self, deg: f64) -> Self {
        self.jitter_deg = deg;
        self
    }

    fn push(&mut self, latitude: f64, longitude: f64) {
        self.fixes.push(Fix::new(latitude, longitude, self.next));
        self.next += Duration::seconds(self.interval_secs);
    }

    /// `count` fixes around `at`.
    fn dwell(mut self, at: (f64, f64), count: usize) -> Self {
        for _ in 0..count {
            let (dlat, dlon) = if self.jitter_deg > 0.0 {
                (
                    self.rng.random_range(-self.jitter_deg..self.jitter_deg),
                    self.rng.random_range(-self.jitter_deg..self.jitter_deg),
                )
            } else {
                (0.0, 0.0)
            };
            self.push(at.0 + dlat, at.1 + dlon);
        }
        self
    }

    /// `steps` fixes moving away from `from` by `direction` degrees each.
    fn walk(mut self, from: (f64, f64), direction: (f64, f64), steps: usize) -> Self {
        for k in 1..=steps {
            let k = k as f64;
            self.push(from.0 + direction.0 * k, from.1 + direction.1 * k);
        }
        self
    }

    /// `steps` fixes approaching `to` from the north, ending one step short.
    fn approach_from_north(self, to: (f64, f64), steps: usize) -> Self {
        let start = (to.0 + STEP_DEG * (steps + 1) as f64, to.1);
        self.walk(start, (-STEP_DEG, 0.0), steps)
    }

    fn build(self) -> Vec<Fix> {
        self.fixes
    }
}

fn controller(
    config: ControllerConfig,
    fixes: Vec<Fix>,
) -> AdaptiveSamplingController<FixStream> {
    AdaptiveSamplingController::new(config, FixStream::new(fixes).unwrap()).unwrap()
}

/// Gaps between consecutive analyzed fixes, in seconds.
fn gaps(fixes: &[Fix]) -> Vec<i64> {
    fixes
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds())
        .collect()
}

/// Home for 50 minutes, out and back for 30 minutes, then home again.
fn revisit_trace(seed: u64, second_dwell_fixes: usize) -> Vec<Fix> {
    TraceBuilder::new(seed)
        .with_jitter(0.0003)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 101)
        .walk(HOME, (STEP_DEG, 0.0), 30)
        .approach_from_north(HOME, 29)
        .dwell(HOME, second_dwell_fixes)
        .dwell(WORK, 40)
        .walk(WORK, (0.0, STEP_DEG), 10)
        .build()
}

// ============================================================================
// Non-adaptive Runs
// ============================================================================

#[test]
fn test_fifty_minute_dwell_yields_one_stay_point() {
    // Three fixes per minute, 50 minutes within a few dozen meters of home
    let fixes = TraceBuilder::new(7)
        .with_interval(20)
        .with_jitter(0.0003)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 150)
        .walk(HOME, (STEP_DEG, 0.0), 10)
        .build();
    let span_secs = (fixes[fixes.len() - 1].timestamp - fixes[0].timestamp).num_seconds();

    let mut controller = controller(ControllerConfig::default(), fixes);
    let summary = controller.run().unwrap();

    // One request per base interval across the whole trace
    assert_eq!(summary.fixes_requested as i64, span_secs / 30 + 1);
    assert_eq!(summary.valid_fixes, summary.fixes_requested);
    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.visits, 1);
    assert_eq!(summary.arrivals, 0);

    let stay_point = &controller.stay_points()[0];
    let offset_m = distance(stay_point.latitude, stay_point.longitude, HOME.0, HOME.1);
    assert!(offset_m < 50.0, "stay point {} m from home", offset_m);

    // From the first request at home to the first one outside
    let stay = controller.visits()[0].stay_time_seconds();
    assert_eq!(stay, 3000);
}

#[test]
fn test_short_dwell_yields_nothing() {
    let fixes = TraceBuilder::new(11)
        .approach_from_north(HOME, 5)
        .dwell(HOME, 60)
        .walk(HOME, (STEP_DEG, 0.0), 5)
        .build();

    let mut controller = controller(ControllerConfig::default(), fixes);
    let summary = controller.run().unwrap();

    assert_eq!(summary.stay_points, 0);
    assert_eq!(summary.visits, 0);
}

#[test]
fn test_revisit_arrives_and_leaves_once() {
    let mut controller = controller(ControllerConfig::default(), revisit_trace(3, 41));
    let summary = controller.run().unwrap();

    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 1);
    assert_eq!(summary.visits, 2);
    assert_eq!(controller.stay_points()[0].visit_count, 2);

    let revisit = &controller.visits()[1];
    assert!(!revisit.is_open());
    // 40 intervals at home, give or take the window pivot
    let stay = revisit.stay_time_seconds();
    assert!((1140..=1260).contains(&stay), "revisit lasted {} s", stay);
    assert!(!controller.mode().is_stay_point());
}

#[test]
fn test_open_visit_closed_at_end_of_stream() {
    let fixes = TraceBuilder::new(5)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 101)
        .walk(HOME, (STEP_DEG, 0.0), 30)
        .approach_from_north(HOME, 29)
        .dwell(HOME, 20)
        .build();
    let last = fixes.last().unwrap().clone();

    let mut controller = controller(ControllerConfig::default(), fixes);
    let summary = controller.run().unwrap();

    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 0);

    let visit = controller.visits().last().unwrap();
    assert!(!visit.is_open());
    assert_eq!(visit.departure_time(), last.timestamp);
    assert_eq!(controller.valid_fixes().last(), Some(&last));
}

#[test]
fn test_preloaded_stay_point_detects_first_arrival() {
    let start = NaiveDate::from_ymd_opt(2017, 4, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let known = LiveStayPoint::new(HOME.0, HOME.1, start, start + Duration::hours(1), 120);

    let fixes = TraceBuilder::new(9)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 30)
        .walk(HOME, (STEP_DEG, 0.0), 10)
        .build();

    let mut controller = controller(ControllerConfig::default(), fixes);
    controller.preload_stay_points(vec![known.clone(), known]);
    let summary = controller.run().unwrap();

    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 1);
    assert_eq!(controller.visits()[0].stay_time_seconds(), 3600);
    assert_eq!(controller.live_stay_points().len(), 2);
}

#[test]
fn test_inaccurate_fixes_are_skipped_but_counted() {
    let mut fixes = TraceBuilder::new(13)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 101)
        .walk(HOME, (STEP_DEG, 0.0), 10)
        .build();
    for fix in fixes.iter_mut().skip(20).step_by(10) {
        fix.accuracy = 400.0;
    }
    let inaccurate = fixes.iter().filter(|f| f.accuracy >= 250.0).count();

    let mut controller = controller(ControllerConfig::default(), fixes.clone());
    let summary = controller.run().unwrap();

    assert_eq!(summary.invalid_fixes, inaccurate);
    assert_eq!(summary.valid_fixes, fixes.len() - inaccurate);
    assert_eq!(summary.stay_points, 1);
}

// ============================================================================
// Adaptive Runs
// ============================================================================

#[test]
fn test_two_hour_predicted_stay_ends_in_late_departure_sampling() {
    let start = NaiveDate::from_ymd_opt(2017, 4, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let known = LiveStayPoint::new(HOME.0, HOME.1, start, start + Duration::hours(2), 360);

    // Two and a half hours at home, three fixes per minute
    let fixes = TraceBuilder::new(23)
        .with_interval(20)
        .with_jitter(0.0003)
        .approach_from_north(HOME, 10)
        .dwell(HOME, 450)
        .dwell(WORK, 90)
        .walk(WORK, (0.0, STEP_DEG), 10)
        .build();
    let recorded = fixes.len();

    let config = ControllerConfig::default()
        .with_adaptive(true)
        .with_late_departure_interval(600);
    let mut controller = controller(config, fixes);
    controller.preload_stay_points(vec![known]);
    let summary = controller.run().unwrap();

    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 1);
    assert!(summary.fixes_requested < recorded / 4);

    let valid = controller.valid_fixes();
    let gaps = gaps(valid);
    assert!(gaps.iter().all(|gap| *gap >= 30), "gaps: {:?}", gaps);

    // The late interval only starts once the two-hour curve is spent
    let visit = &controller.visits()[1];
    let first_late = gaps
        .iter()
        .position(|gap| *gap == 600)
        .expect("never reached the late interval");
    let curve_secs = (valid[first_late].timestamp - visit.detection_arrival_fix.timestamp).num_seconds();
    assert!((7100..7200).contains(&curve_secs), "curve spent after {} s", curve_secs);

    assert!(!visit.is_open());
    assert!(visit.stay_time_seconds() > 7200);
}

#[test]
fn test_revisit_reaches_late_departure_interval() {
    let config = ControllerConfig::default()
        .with_adaptive(true)
        .with_late_departure_interval(600);
    let fixes = revisit_trace(21, 241);
    let recorded = fixes.len();

    let mut controller = controller(config, fixes);
    let summary = controller.run().unwrap();

    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 1);
    assert!(summary.fixes_requested < recorded);

    let gaps = gaps(controller.valid_fixes());
    assert!(gaps.iter().all(|gap| *gap >= 30), "gaps: {:?}", gaps);
    assert!(gaps.contains(&600), "never reached the late interval: {:?}", gaps);

    let revisit = &controller.visits()[1];
    assert!(revisit.stay_time_seconds() > 6600);
}

#[test]
fn test_adaptive_run_spends_fewer_fixes_than_base_sampling() {
    let fixes = revisit_trace(17, 241);

    let mut base = controller(ControllerConfig::default(), fixes.clone());
    let base_summary = base.run().unwrap();

    let mut adaptive = controller(ControllerConfig::default().with_adaptive(true), fixes);
    let adaptive_summary = adaptive.run().unwrap();

    assert_eq!(base_summary.stay_points, adaptive_summary.stay_points);
    assert_eq!(base_summary.arrivals, adaptive_summary.arrivals);
    assert!(adaptive_summary.fixes_requested < base_summary.fixes_requested);
}

#[test]
fn test_noisy_dwells_never_duplicate_stay_points() {
    for seed in 0..8 {
        let mut controller = controller(ControllerConfig::default(), revisit_trace(seed, 101));
        let summary = controller.run().unwrap();

        // The second stay at home is long enough to be detected again, but it
        // lands within the dedup radius of the first one.
        assert_eq!(summary.stay_points, 1, "seed {}", seed);
        assert!(controller.live_stay_points().len() >= 2, "seed {}", seed);
    }
}
