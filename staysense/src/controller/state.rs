//! Sampling mode and run summary.

use std::fmt;

use serde::Serialize;

use crate::sampling::SamplingCurveGenerator;

/// What the controller believes the subject is doing.
#[derive(Debug, Clone, Default)]
pub enum SamplingMode {
    /// Moving between stay points: sample at the base interval.
    #[default]
    Trajectory,
    /// Staying at a stay point: follow the stay curve.
    StayPoint {
        stay_point_id: u32,
        curve: SamplingCurveGenerator,
        /// Curve offset reached so far, in whole seconds.
        cumulative_offset: i64,
    },
}

impl SamplingMode {
    /// Whether the subject is at a stay point.
    pub fn is_stay_point(&self) -> bool {
        matches!(self, Self::StayPoint { .. })
    }

    /// Stay point the subject is at, if any.
    pub fn stay_point_id(&self) -> Option<u32> {
        match self {
            Self::StayPoint { stay_point_id, .. } => Some(*stay_point_id),
            Self::Trajectory => None,
        }
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trajectory => write!(f, "trajectory"),
            Self::StayPoint { stay_point_id, .. } => write!(f, "stay point {}", stay_point_id),
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Requests answered by the source.
    pub fixes_requested: usize,
    /// Requests that returned a different fix than the previous request.
    pub distinct_fixes: usize,
    /// Fixes accepted for analysis (including the closing fix).
    pub valid_fixes: usize,
    /// Fixes rejected as invalid.
    pub invalid_fixes: usize,
    pub stay_points: usize,
    pub visits: usize,
    pub arrivals: usize,
    pub departures: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fixes requested:  {}", self.fixes_requested)?;
        writeln!(f, "Distinct fixes:   {}", self.distinct_fixes)?;
        writeln!(f, "Valid fixes:      {}", self.valid_fixes)?;
        writeln!(f, "Invalid fixes:    {}", self.invalid_fixes)?;
        writeln!(f, "Stay points:      {}", self.stay_points)?;
        writeln!(f, "Visits:           {}", self.visits)?;
        writeln!(f, "Arrivals:         {}", self.arrivals)?;
        write!(f, "Departures:       {}", self.departures)
    }
}
