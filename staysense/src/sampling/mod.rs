//! Prediction-driven sampling schedules.
//!
//! A [`SamplingCurveGenerator`] turns a predicted interval into a list of
//! offsets at which the next fixes should be requested. Three shapes are
//! supported:
//!
//! | Kind            | Domain    | Cadence                                    |
//! |-----------------|-----------|--------------------------------------------|
//! | `Linear`        | `[0, 1]`  | constant                                   |
//! | `Sigmoid`       | `[-5, 5]` | slow, fast, slow                           |
//! | `SlicedSigmoid` | `[-5, 5]` | sigmoid, with a gap cap per domain segment |
//!
//! The [`decision`] module maps arrival and departure notifications onto
//! absolute sampling times.

mod curve;
pub mod decision;
mod generator;

use thiserror::Error;

pub use curve::SamplingPolicyCurve;
pub use decision::{MobilityEvent, SamplingDecisionMaker};
pub use generator::{CurveKind, CurveSegment, SamplingCurveGenerator};

/// Errors raised while building a sampling curve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("prediction interval is negative ({seconds} s)")]
    NegativeInterval { seconds: f64 },

    #[error("sliced sigmoid needs at least one segment")]
    EmptySegments,

    #[error("segment {index} has non-positive maximum separation {value}")]
    NonPositiveSeparation { index: usize, value: f64 },

    #[error("expected 1 or {expected} separations, found {found}")]
    SeparationCountMismatch { expected: usize, found: usize },

    #[error("segment {index} [{start}, {end}] is empty or overlaps the previous segment")]
    InvalidSegment { index: usize, start: f64, end: f64 },

    #[error("sigmoid steepness must be positive, got {0}")]
    NonPositiveAlpha(f64),
}
