//! Sampling decisions from mobility notifications.
//!
//! On arrival at a stay point the subject is expected to stay put, so the
//! predicted dwell is covered by a sigmoid schedule with a few samples per
//! hour. On departure the subject is moving, so the predicted trip gets a
//! linear schedule of one sample per minute.

use chrono::{Duration, NaiveDateTime};

use super::{CurveError, CurveKind, SamplingCurveGenerator};
use crate::model::GeoFencingOutcome;

/// Schedules per predicted hour inside a stay point.
pub const STAY_POINT_SCHEDULES_PER_HOUR: usize = 6;

/// Schedules per predicted hour on a trajectory.
pub const TRAJECTORY_SCHEDULES_PER_HOUR: usize = 60;

/// Mobility change that triggers a new sampling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobilityEvent {
    Arrival,
    Departure,
}

impl MobilityEvent {
    /// Event carried by a geofencing outcome.
    ///
    /// A combined leave-and-arrive counts as an arrival, since the subject
    /// ends up inside a stay point.
    pub fn from_outcome(outcome: &GeoFencingOutcome) -> Option<Self> {
        match outcome {
            GeoFencingOutcome::Arriving { .. } | GeoFencingOutcome::LeavingAndArriving { .. } => {
                Some(Self::Arrival)
            }
            GeoFencingOutcome::Leaving { .. } => Some(Self::Departure),
            GeoFencingOutcome::NoChange { .. } => None,
        }
    }
}

/// Converts mobility notifications into absolute sampling times.
#[derive(Debug, Default)]
pub struct SamplingDecisionMaker {
    generator: Option<SamplingCurveGenerator>,
    prediction_start: Option<NaiveDateTime>,
    prediction_end: Option<NaiveDateTime>,
}

impl SamplingDecisionMaker {
    /// Create a decision maker with no active prediction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active schedule for a new prediction.
    pub fn receive_notification(
        &mut self,
        event: MobilityEvent,
        prediction_start: NaiveDateTime,
        prediction_end: NaiveDateTime,
    ) -> Result<(), CurveError> {
        self.generator = None;
        self.prediction_start = Some(prediction_start);
        self.prediction_end = Some(prediction_end);

        let hours = ((prediction_end - prediction_start).num_seconds() / 3600).max(0) as usize;
        let kind = match event {
            MobilityEvent::Arrival => CurveKind::Sigmoid {
                total_schedules: STAY_POINT_SCHEDULES_PER_HOUR * hours,
                alpha: 1.0,
            },
            MobilityEvent::Departure => CurveKind::Linear {
                total_schedules: TRAJECTORY_SCHEDULES_PER_HOUR * hours,
            },
        };

        let generator = SamplingCurveGenerator::new(prediction_start, prediction_end, kind)?;
        tracing::debug!(
            event = ?event,
            start = %prediction_start,
            end = %prediction_end,
            schedules = generator.len(),
            "Sampling decision updated"
        );
        self.generator = Some(generator);
        Ok(())
    }

    /// Next absolute sampling time, or `None` when nothing is scheduled.
    pub fn next_action(&mut self) -> Option<NaiveDateTime> {
        let start = self.prediction_start?;
        let offset = self.generator.as_mut()?.next_schedule()?;
        Some(start + Duration::milliseconds((offset * 1000.0).round() as i64))
    }

    /// Active schedule, if any.
    pub fn generator(&self) -> Option<&SamplingCurveGenerator> {
        self.generator.as_ref()
    }

    /// End of the active prediction.
    pub fn prediction_end(&self) -> Option<NaiveDateTime> {
        self.prediction_end
    }
}
