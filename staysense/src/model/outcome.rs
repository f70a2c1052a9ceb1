//! Geofencing outcome.

use std::fmt;

use serde::Serialize;

use super::fix::Fix;
use super::stay_point::StayPoint;

/// Mobility change reported by the geofence for one evaluated fix.
///
/// `event_fix` is the fix at which the change is judged to have happened
/// (the window pivot, or the first window fix for a cold-start arrival).
/// `detection_fix` is the newest fix, the one that made the change visible.
#[derive(Debug, Clone, Serialize)]
pub enum GeoFencingOutcome {
    /// Nothing changed; `current` is the stay point the subject occupies, if any.
    NoChange {
        current: Option<StayPoint>,
        event_fix: Fix,
        detection_fix: Fix,
    },
    /// The subject left `stay_point`.
    Leaving {
        stay_point: StayPoint,
        event_fix: Fix,
        detection_fix: Fix,
    },
    /// The subject arrived at `stay_point`.
    Arriving {
        stay_point: StayPoint,
        event_fix: Fix,
        detection_fix: Fix,
    },
    /// The subject left `from` and arrived at `to` in the same evaluation.
    LeavingAndArriving {
        from: StayPoint,
        to: StayPoint,
        event_fix: Fix,
        detection_fix: Fix,
    },
}

impl GeoFencingOutcome {
    /// Fix at which the change happened.
    pub fn event_fix(&self) -> &Fix {
        match self {
            Self::NoChange { event_fix, .. }
            | Self::Leaving { event_fix, .. }
            | Self::Arriving { event_fix, .. }
            | Self::LeavingAndArriving { event_fix, .. } => event_fix,
        }
    }

    /// Fix that made the change visible.
    pub fn detection_fix(&self) -> &Fix {
        match self {
            Self::NoChange { detection_fix, .. }
            | Self::Leaving { detection_fix, .. }
            | Self::Arriving { detection_fix, .. }
            | Self::LeavingAndArriving { detection_fix, .. } => detection_fix,
        }
    }

    /// Stay point arrived at, for arrival outcomes.
    pub fn arrived(&self) -> Option<&StayPoint> {
        match self {
            Self::Arriving { stay_point, .. } => Some(stay_point),
            Self::LeavingAndArriving { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Stay point left, for departure outcomes.
    pub fn departed(&self) -> Option<&StayPoint> {
        match self {
            Self::Leaving { stay_point, .. } => Some(stay_point),
            Self::LeavingAndArriving { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Whether this outcome reports no change.
    pub fn is_no_change(&self) -> bool {
        matches!(self, Self::NoChange { .. })
    }

    /// Short event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::NoChange { .. } => "No change",
            Self::Leaving { .. } => "Leaving stay point",
            Self::Arriving { .. } => "Arriving to stay point",
            Self::LeavingAndArriving { .. } => "Leaving and arriving",
        }
    }
}

impl fmt::Display for GeoFencingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange {
                current: Some(sp), ..
            } => write!(f, "{} at stay point {}", self.event_name(), sp.id),
            Self::NoChange { current: None, .. } => write!(f, "{}", self.event_name()),
            Self::Leaving {
                stay_point,
                event_fix,
                ..
            }
            | Self::Arriving {
                stay_point,
                event_fix,
                ..
            } => write!(
                f,
                "{} {} at {}",
                self.event_name(),
                stay_point.id,
                event_fix.timestamp
            ),
            Self::LeavingAndArriving {
                from,
                to,
                event_fix,
                ..
            } => write!(
                f,
                "{} ({} -> {}) at {}",
                self.event_name(),
                from.id,
                to.id,
                event_fix.timestamp
            ),
        }
    }
}
