//! Sampling curve generator.
//!
//! Turns a prediction interval and a curve kind into an ordered list of
//! offsets (seconds from the start of the interval) and hands them out one
//! at a time.

use chrono::NaiveDateTime;

use super::curve::{linspace, SamplingPolicyCurve};
use super::CurveError;

/// One slice of the sigmoid domain with its own gap cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    /// Domain start (inclusive).
    pub start: f64,
    /// Domain end (inclusive).
    pub end: f64,
    /// Largest allowed gap between consecutive offsets in this segment.
    pub max_separation_secs: f64,
}

impl CurveSegment {
    /// Create a segment.
    pub fn new(start: f64, end: f64, max_separation_secs: f64) -> Self {
        Self {
            start,
            end,
            max_separation_secs,
        }
    }

    /// Build segments from domain bounds and separations.
    ///
    /// A single separation is shared by every segment; otherwise there must
    /// be exactly one separation per segment.
    pub fn from_bounds(
        bounds: &[(f64, f64)],
        separations: &[f64],
    ) -> Result<Vec<CurveSegment>, CurveError> {
        if separations.len() != 1 && separations.len() != bounds.len() {
            return Err(CurveError::SeparationCountMismatch {
                expected: bounds.len(),
                found: separations.len(),
            });
        }

        Ok(bounds
            .iter()
            .enumerate()
            .map(|(i, (start, end))| {
                let separation = if separations.len() == 1 {
                    separations[0]
                } else {
                    separations[i]
                };
                CurveSegment::new(*start, *end, separation)
            })
            .collect())
    }
}

/// Kind of curve to generate, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveKind {
    /// Evenly spaced offsets.
    Linear { total_schedules: usize },
    /// Offsets following a logistic curve.
    Sigmoid { total_schedules: usize, alpha: f64 },
    /// Logistic curve sliced into segments, each sampled densely enough to
    /// keep gaps under its own cap.
    SlicedSigmoid {
        alpha: f64,
        segments: Vec<CurveSegment>,
    },
}

impl CurveKind {
    /// Check the curve parameters without generating a schedule.
    pub fn validate(&self) -> Result<(), CurveError> {
        match self {
            Self::Linear { .. } => Ok(()),
            Self::Sigmoid { alpha, .. } => validate_alpha(*alpha),
            Self::SlicedSigmoid { alpha, segments } => {
                validate_alpha(*alpha)?;
                if segments.is_empty() {
                    return Err(CurveError::EmptySegments);
                }

                let mut previous_end = f64::NEG_INFINITY;
                for (index, segment) in segments.iter().enumerate() {
                    if segment.max_separation_secs <= 0.0 {
                        return Err(CurveError::NonPositiveSeparation {
                            index,
                            value: segment.max_separation_secs,
                        });
                    }
                    if segment.start >= segment.end || segment.start < previous_end {
                        return Err(CurveError::InvalidSegment {
                            index,
                            start: segment.start,
                            end: segment.end,
                        });
                    }
                    previous_end = segment.end;
                }
                Ok(())
            }
        }
    }
}

fn validate_alpha(alpha: f64) -> Result<(), CurveError> {
    if alpha > 0.0 {
        Ok(())
    } else {
        Err(CurveError::NonPositiveAlpha(alpha))
    }
}

/// Ordered sampling schedule over one prediction interval.
#[derive(Debug, Clone)]
pub struct SamplingCurveGenerator {
    length_secs: f64,
    offsets: Vec<f64>,
    /// Segment each offset came from, parallel to `offsets`.
    segment_of: Vec<usize>,
    cursor: usize,
}

impl SamplingCurveGenerator {
    /// Generate a schedule for `[start, end)`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        kind: CurveKind,
    ) -> Result<Self, CurveError> {
        let length_secs = (end - start).num_milliseconds() as f64 / 1000.0;
        Self::with_length(length_secs, kind)
    }

    /// Generate a schedule for an interval of `length_secs` seconds.
    pub fn with_length(length_secs: f64, kind: CurveKind) -> Result<Self, CurveError> {
        if length_secs < 0.0 {
            return Err(CurveError::NegativeInterval {
                seconds: length_secs,
            });
        }
        kind.validate()?;

        let (offsets, segment_of) = match &kind {
            CurveKind::Linear { total_schedules } => {
                single_segment(SamplingPolicyCurve::Linear, *total_schedules, length_secs)
            }
            CurveKind::Sigmoid {
                total_schedules,
                alpha,
            } => single_segment(
                SamplingPolicyCurve::Sigmoid { alpha: *alpha },
                *total_schedules,
                length_secs,
            ),
            CurveKind::SlicedSigmoid { alpha, segments } => sliced(
                SamplingPolicyCurve::Sigmoid { alpha: *alpha },
                segments,
                length_secs,
            ),
        };

        tracing::debug!(
            length_secs,
            schedules = offsets.len(),
            kind = ?kind,
            "Sampling curve generated"
        );

        Ok(Self {
            length_secs,
            offsets,
            segment_of,
            cursor: 0,
        })
    }

    /// Pop the next offset, or `None` once exhausted.
    pub fn next_schedule(&mut self) -> Option<f64> {
        let value = self.offsets.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(value)
    }

    /// Whether every offset has been handed out.
    pub fn is_done(&self) -> bool {
        self.cursor >= self.offsets.len()
    }

    /// Segment of the next offset to be handed out; `None` once exhausted.
    pub fn current_segment(&self) -> Option<usize> {
        self.segment_of.get(self.cursor).copied()
    }

    /// Segment an offset came from.
    pub fn segment_of(&self, index: usize) -> Option<usize> {
        self.segment_of.get(index).copied()
    }

    /// All offsets, in order.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Number of offsets.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the schedule has no offsets at all.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of offsets not yet handed out.
    pub fn remaining(&self) -> usize {
        self.offsets.len() - self.cursor
    }

    /// Length of the prediction interval in seconds.
    pub fn length_secs(&self) -> f64 {
        self.length_secs
    }
}

fn single_segment(
    curve: SamplingPolicyCurve,
    total_schedules: usize,
    length_secs: f64,
) -> (Vec<f64>, Vec<usize>) {
    let (domain_start, domain_end) = curve.domain();
    let offsets: Vec<f64> = linspace(domain_start, domain_end, total_schedules)
        .into_iter()
        .map(|x| length_secs * curve.evaluate(x))
        .collect();
    let segment_of = vec![0; offsets.len()];
    (offsets, segment_of)
}

fn sliced(
    curve: SamplingPolicyCurve,
    segments: &[CurveSegment],
    length_secs: f64,
) -> (Vec<f64>, Vec<usize>) {
    let mut xs: Vec<f64> = Vec::new();
    let mut segment_of = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let slots = slots_for_segment(curve, segment, length_secs);
        for x in linspace(segment.start, segment.end, slots) {
            // Adjacent segments share their boundary point
            if xs.last() != Some(&x) {
                xs.push(x);
                segment_of.push(index);
            }
        }
    }

    let offsets = xs
        .into_iter()
        .map(|x| length_secs * curve.evaluate(x))
        .collect();
    (offsets, segment_of)
}

/// Fewest evenly spaced domain points that keep every gap in the segment
/// under its cap.
///
/// The average slope gives a lower bound and the steepest slope an upper
/// bound that always fits; the count is binary searched in between.
fn slots_for_segment(curve: SamplingPolicyCurve, segment: &CurveSegment, length_secs: f64) -> usize {
    let fits = |slots: usize| max_gap(curve, segment, slots, length_secs) <= segment.max_separation_secs;

    let width = segment.end - segment.start;
    let span = length_secs * (curve.evaluate(segment.end) - curve.evaluate(segment.start));
    let mut low = (span / segment.max_separation_secs).floor() as usize + 2;
    let steepest = length_secs * curve.max_slope(segment.start, segment.end) * width;
    let mut high = ((steepest / segment.max_separation_secs).ceil() as usize + 2).max(low);

    if fits(low) {
        return low;
    }
    // `high` fits up to rounding
    while high - low > 1 {
        let middle = low + (high - low) / 2;
        if fits(middle) {
            high = middle;
        } else {
            low = middle;
        }
    }
    high
}

fn max_gap(curve: SamplingPolicyCurve, segment: &CurveSegment, slots: usize, length_secs: f64) -> f64 {
    linspace(segment.start, segment.end, slots)
        .windows(2)
        .map(|w| length_secs * (curve.evaluate(w[1]) - curve.evaluate(w[0])))
        .fold(0.0, f64::max)
}
