//! Visit type.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::fix::{Fix, DISPLAY_TIME_FORMAT};
use super::stay_point::LiveStayPoint;

/// One arrival-to-departure interval at a stay point.
///
/// Pivot fixes mark the real-world arrival and departure; detection fixes
/// mark when the engine noticed them (never earlier than the pivots). The
/// stay time is derived from the pivots and refreshed by [`Visit::close`],
/// the only mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    /// Store-assigned identifier (1-based, 0 while unregistered).
    pub id: u32,
    /// Stay point this visit belongs to.
    pub stay_point_id: u32,
    /// Fix judged as the real-world arrival.
    pub pivot_arrival_fix: Fix,
    /// Fix judged as the real-world departure.
    pub pivot_departure_fix: Fix,
    /// Fix at which the arrival was detected.
    pub detection_arrival_fix: Fix,
    /// Fix at which the departure was detected.
    pub detection_departure_fix: Fix,
    stay_time_seconds: i64,
}

impl Visit {
    /// Create a visit from all four fixes.
    pub fn new(
        stay_point_id: u32,
        pivot_arrival_fix: Fix,
        pivot_departure_fix: Fix,
        detection_arrival_fix: Fix,
        detection_departure_fix: Fix,
    ) -> Self {
        let mut visit = Self {
            id: 0,
            stay_point_id,
            pivot_arrival_fix,
            pivot_departure_fix,
            detection_arrival_fix,
            detection_departure_fix,
            stay_time_seconds: 0,
        };
        visit.update_stay_time();
        visit
    }

    /// Open a visit at an arrival; departure equals arrival until closed.
    pub fn opened(stay_point_id: u32, pivot_fix: Fix, detection_fix: Fix) -> Self {
        Self::new(
            stay_point_id,
            pivot_fix.clone(),
            pivot_fix,
            detection_fix.clone(),
            detection_fix,
        )
    }

    /// Visit spanning a freshly detected stay point candidate.
    ///
    /// The candidate's arrival and departure become both pivot and detection
    /// fixes, placed at the candidate's centroid.
    pub fn from_live_stay_point(stay_point_id: u32, live: &LiveStayPoint) -> Self {
        let arrival = Fix::new(live.latitude, live.longitude, live.arrival_time);
        let departure = Fix::new(live.latitude, live.longitude, live.departure_time);
        Self::new(
            stay_point_id,
            arrival.clone(),
            departure.clone(),
            arrival,
            departure,
        )
    }

    /// Close the visit at the given departure fixes.
    ///
    /// A departure pivot earlier than the arrival pivot is clamped to the
    /// arrival so the stay time never goes negative.
    pub fn close(&mut self, pivot_departure_fix: Fix, detection_departure_fix: Fix) {
        if pivot_departure_fix.timestamp < self.pivot_arrival_fix.timestamp {
            tracing::warn!(
                visit = self.id,
                stay_point = self.stay_point_id,
                arrival = %self.pivot_arrival_fix.timestamp,
                departure = %pivot_departure_fix.timestamp,
                "Departure pivot precedes arrival, clamping to arrival"
            );
            self.pivot_departure_fix = self.pivot_arrival_fix.clone();
        } else {
            self.pivot_departure_fix = pivot_departure_fix;
        }
        self.detection_departure_fix = detection_departure_fix;
        self.update_stay_time();
    }

    /// Whether the departure has not been recorded yet.
    ///
    /// An open visit has identical arrival and departure pivot timestamps.
    pub fn is_open(&self) -> bool {
        self.pivot_arrival_fix.timestamp == self.pivot_departure_fix.timestamp
    }

    /// Stay time in seconds (departure pivot minus arrival pivot).
    pub fn stay_time_seconds(&self) -> i64 {
        self.stay_time_seconds
    }

    /// Real-world arrival time.
    pub fn arrival_time(&self) -> NaiveDateTime {
        self.pivot_arrival_fix.timestamp
    }

    /// Real-world departure time.
    pub fn departure_time(&self) -> NaiveDateTime {
        self.pivot_departure_fix.timestamp
    }

    fn update_stay_time(&mut self) {
        self.stay_time_seconds =
            (self.pivot_departure_fix.timestamp - self.pivot_arrival_fix.timestamp).num_seconds();
    }
}

impl fmt::Display for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.id,
            self.stay_point_id,
            self.arrival_time().format(DISPLAY_TIME_FORMAT),
            self.departure_time().format(DISPLAY_TIME_FORMAT),
            self.stay_time_seconds
        )
    }
}
