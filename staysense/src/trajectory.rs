//! Trajectory comparison.
//!
//! Measures how far a sub-sampled trajectory strays from a ground-truth
//! trajectory of the same trip. Each sampled fix is matched to the ground
//! truth fix closest in time. In interpolated mode the ground truth fixes
//! between two consecutive samples are also compared against positions
//! interpolated along the sampled segment, proportionally to elapsed time.

use thiserror::Error;

use crate::geodesic::GeoPoint;
use crate::model::Fix;

/// Errors raised when comparing trajectories.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("{0} trajectory is empty")]
    EmptyTrajectory(&'static str),
}

/// Time-ordered sequence of fixes.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    fixes: Vec<Fix>,
}

impl Trajectory {
    pub fn new(fixes: Vec<Fix>) -> Self {
        Self { fixes }
    }

    pub fn get(&self, index: usize) -> Option<&Fix> {
        self.fixes.get(index)
    }

    pub fn first(&self) -> Option<&Fix> {
        self.fixes.first()
    }

    pub fn last(&self) -> Option<&Fix> {
        self.fixes.last()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Index of the fix closest in time to `fix`, scanning from `start`.
    ///
    /// Ties go to the later fix.
    pub fn time_closest_index(&self, fix: &Fix, start: usize) -> Option<usize> {
        let last = self.fixes.len().checked_sub(1)?;
        let start = start.min(last);

        let next = (start..=last)
            .find(|i| fix.timestamp < self.fixes[*i].timestamp)
            .unwrap_or(last);
        if next == 0 {
            return Some(0);
        }

        let previous = next - 1;
        let to_previous = fix.timestamp - self.fixes[previous].timestamp;
        let to_next = self.fixes[next].timestamp - fix.timestamp;
        Some(if to_previous < to_next { previous } else { next })
    }

    /// Fixes from `start` to `end`, both inclusive.
    pub fn sub_trajectory(&self, start: usize, end: usize) -> &[Fix] {
        let end = end.min(self.fixes.len().saturating_sub(1));
        self.fixes.get(start..=end).unwrap_or(&[])
    }

    /// Length of the path through every fix, in meters.
    pub fn internal_distance(&self) -> f64 {
        self.fixes
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }
}

impl From<Vec<Fix>> for Trajectory {
    fn from(fixes: Vec<Fix>) -> Self {
        Self::new(fixes)
    }
}

/// Result of a trajectory comparison.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ComparisonReport {
    /// Sum of distances between matched positions, in meters.
    pub distance_sum_m: f64,
    /// Number of positions compared.
    pub compared_fixes: usize,
}

impl ComparisonReport {
    /// Mean distance per compared position, in meters.
    pub fn mean_error_m(&self) -> f64 {
        if self.compared_fixes == 0 {
            0.0
        } else {
            self.distance_sum_m / self.compared_fixes as f64
        }
    }
}

/// Compares a sub-sampled trajectory against its ground truth.
pub struct TrajectoryComparator<'a> {
    ground_truth: &'a Trajectory,
    sampled: &'a Trajectory,
}

impl<'a> TrajectoryComparator<'a> {
    pub fn new(ground_truth: &'a Trajectory, sampled: &'a Trajectory) -> Self {
        Self {
            ground_truth,
            sampled,
        }
    }

    /// Compare every ground truth fix against the sampled path, with
    /// positions between samples interpolated by elapsed time.
    pub fn compare_interpolated(&self) -> Result<ComparisonReport, ComparisonError> {
        self.check_not_empty()?;

        let gt = self.ground_truth;
        let samples = self.sampled.fixes();

        let mut distance_sum = 0.0;
        let mut compared = 0;
        let mut left_index = 0;
        let mut right_index = 0;

        for pair in samples.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);

            left_index = gt.time_closest_index(left, left_index).unwrap_or(0);
            right_index = gt
                .time_closest_index(right, left_index)
                .unwrap_or(left_index)
                .max(left_index);

            let enclosed = gt.sub_trajectory(left_index, right_index);
            let Some(anchor) = enclosed.first() else {
                continue;
            };
            distance_sum += anchor.distance_to(left);
            compared += 1;

            for (projected, truth) in project_by_time(enclosed, left, right)
                .iter()
                .zip(enclosed.iter().skip(1))
            {
                distance_sum += projected.distance_to(truth);
                compared += 1;
            }
        }

        distance_sum += self.last_point_distance(right_index);
        compared += 1;

        Ok(ComparisonReport {
            distance_sum_m: distance_sum,
            compared_fixes: compared,
        })
    }

    /// Compare only the sampled fixes against the ground truth fixes
    /// closest to them in time.
    pub fn compare_nearest(&self) -> Result<ComparisonReport, ComparisonError> {
        self.check_not_empty()?;

        let gt = self.ground_truth;
        let samples = self.sampled.fixes();

        let mut distance_sum = 0.0;
        let mut left_index = 0;

        for sample in &samples[..samples.len() - 1] {
            left_index = gt.time_closest_index(sample, left_index).unwrap_or(0);
            if let Some(truth) = gt.get(left_index) {
                let distance = sample.distance_to(truth);
                if distance > 200.0 {
                    tracing::debug!(
                        at = %sample.timestamp,
                        distance_m = distance,
                        "Sampled fix far from ground truth"
                    );
                }
                distance_sum += distance;
            }
        }

        distance_sum += self.last_point_distance(0);

        Ok(ComparisonReport {
            distance_sum_m: distance_sum,
            compared_fixes: samples.len(),
        })
    }

    fn check_not_empty(&self) -> Result<(), ComparisonError> {
        if self.ground_truth.is_empty() {
            return Err(ComparisonError::EmptyTrajectory("ground truth"));
        }
        if self.sampled.is_empty() {
            return Err(ComparisonError::EmptyTrajectory("sampled"));
        }
        Ok(())
    }

    fn last_point_distance(&self, start: usize) -> f64 {
        let Some(last) = self.sampled.last() else {
            return 0.0;
        };
        self.ground_truth
            .time_closest_index(last, start)
            .and_then(|i| self.ground_truth.get(i))
            .map(|truth| last.distance_to(truth))
            .unwrap_or(0.0)
    }
}

/// Positions on the segment `left -> right` for the inner fixes of
/// `enclosed`, placed proportionally to their elapsed time.
fn project_by_time(enclosed: &[Fix], left: &Fix, right: &Fix) -> Vec<Fix> {
    let (Some(first), Some(last)) = (enclosed.first(), enclosed.last()) else {
        return Vec::new();
    };
    if enclosed.len() < 3 {
        return Vec::new();
    }

    let span = (last.timestamp - first.timestamp).num_milliseconds() as f64;
    enclosed[1..enclosed.len() - 1]
        .iter()
        .map(|fix| {
            let k1 = (fix.timestamp - first.timestamp).num_milliseconds() as f64;
            let k2 = span - k1;
            interpolate(left, right, k1, k2, fix)
        })
        .collect()
}

/// Split the segment `start -> end` in the proportion `k1 : k2`.
fn interpolate(start: &Fix, end: &Fix, k1: f64, k2: f64, at: &Fix) -> Fix {
    let (latitude, longitude) = if k1 == 0.0 && k2 == 0.0 {
        (end.latitude, end.longitude)
    } else {
        (
            (k1 * end.latitude + k2 * start.latitude) / (k1 + k2),
            (k1 * end.longitude + k2 * start.longitude) / (k1 + k2),
        )
    };
    Fix::new(latitude, longitude, at.timestamp)
}
