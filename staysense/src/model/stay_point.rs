//! Stay point types.
//!
//! A [`LiveStayPoint`] is the raw candidate emitted by the stay point
//! detector; a [`StayPoint`] is what the store keeps once the candidate has
//! been accepted and given an id.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::fix::{Fix, DISPLAY_TIME_FORMAT};
use crate::geodesic::GeoPoint;

/// Stay point candidate built from a contiguous run of fixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStayPoint {
    /// Mean latitude of the contributing fixes.
    pub latitude: f64,
    /// Mean longitude of the contributing fixes.
    pub longitude: f64,
    /// Timestamp of the first contributing fix.
    pub arrival_time: NaiveDateTime,
    /// Timestamp of the last contributing fix.
    pub departure_time: NaiveDateTime,
    /// Visit count (not tracked for candidates, kept for parity with stored points).
    pub visit_count: u32,
    /// Number of fixes averaged into this candidate.
    pub fix_count: usize,
}

impl LiveStayPoint {
    /// Create a candidate from explicit values.
    pub fn new(
        latitude: f64,
        longitude: f64,
        arrival_time: NaiveDateTime,
        departure_time: NaiveDateTime,
        fix_count: usize,
    ) -> Self {
        Self {
            latitude,
            longitude,
            arrival_time,
            departure_time,
            visit_count: 0,
            fix_count,
        }
    }

    /// Build a candidate by averaging the coordinates of `fixes`.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_fixes(fixes: &[Fix]) -> Option<Self> {
        let first = fixes.first()?;
        let last = fixes.last()?;

        let count = fixes.len() as f64;
        let (sum_lat, sum_lon) = fixes
            .iter()
            .fold((0.0, 0.0), |(lat, lon), f| (lat + f.latitude, lon + f.longitude));

        Some(Self::new(
            sum_lat / count,
            sum_lon / count,
            first.timestamp,
            last.timestamp,
            fixes.len(),
        ))
    }

    /// Time spanned by the contributing fixes, in seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.departure_time - self.arrival_time).num_seconds()
    }
}

impl GeoPoint for LiveStayPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for LiveStayPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.arrival_time == other.arrival_time
            && self.departure_time == other.departure_time
    }
}

impl fmt::Display for LiveStayPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.latitude,
            self.longitude,
            self.arrival_time.format(DISPLAY_TIME_FORMAT),
            self.departure_time.format(DISPLAY_TIME_FORMAT),
            self.fix_count
        )
    }
}

/// A registered place where the subject dwelled.
///
/// Identity is purely spatial: two stay points are equal when their
/// coordinates match, regardless of id or visit count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayPoint {
    /// Store-assigned identifier (1-based, 0 while unregistered).
    pub id: u32,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Number of visits recorded at this stay point.
    pub visit_count: u32,
}

impl StayPoint {
    /// Create a stay point.
    pub fn new(id: u32, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
            visit_count: 0,
        }
    }
}

impl From<&LiveStayPoint> for StayPoint {
    fn from(live: &LiveStayPoint) -> Self {
        Self::new(0, live.latitude, live.longitude)
    }
}

impl GeoPoint for StayPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for StayPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl fmt::Display for StayPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.id, self.latitude, self.longitude, self.visit_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 4, 3)
            .unwrap()
            .and_hms_opt(9, m, 0)
            .unwrap()
    }

    #[test]
    fn test_from_fixes_averages_coordinates() {
        let fixes = vec![
            Fix::new(19.0, -99.0, ts(0)),
            Fix::new(19.2, -99.2, ts(1)),
            Fix::new(19.4, -99.4, ts(2)),
        ];
        let sp = LiveStayPoint::from_fixes(&fixes).unwrap();

        assert!((sp.latitude - 19.2).abs() < 1e-12);
        assert!((sp.longitude + 99.2).abs() < 1e-12);
        assert_eq!(sp.arrival_time, ts(0));
        assert_eq!(sp.departure_time, ts(2));
        assert_eq!(sp.fix_count, 3);
        assert_eq!(sp.duration_secs(), 120);
    }

    #[test]
    fn test_from_empty_fixes_is_none() {
        assert!(LiveStayPoint::from_fixes(&[]).is_none());
    }

    #[test]
    fn test_stay_point_equality_is_spatial() {
        let mut a = StayPoint::new(1, 19.0, -99.0);
        let b = StayPoint::new(7, 19.0, -99.0);
        a.visit_count = 4;
        assert_eq!(a, b);
        assert_ne!(a, StayPoint::new(1, 19.0001, -99.0));
    }

    #[test]
    fn test_stay_point_from_live_is_unregistered() {
        let live = LiveStayPoint::new(19.0, -99.0, ts(0), ts(50), 150);
        let sp = StayPoint::from(&live);
        assert_eq!(sp.id, 0);
        assert_eq!(sp.visit_count, 0);
        assert_eq!(sp.latitude, 19.0);
    }

    #[test]
    fn test_display_formats() {
        let live = LiveStayPoint::new(19.5, -99.5, ts(0), ts(50), 150);
        assert_eq!(
            live.to_string(),
            "19.5,-99.5,2017-04-03 09:00:00,2017-04-03 09:50:00,150"
        );
        assert_eq!(StayPoint::new(3, 19.5, -99.5).to_string(), "3,19.5,-99.5,0");
    }
}
