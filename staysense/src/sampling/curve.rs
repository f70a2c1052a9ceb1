//! Sampling policy curves.
//!
//! A policy curve maps a normalized domain onto `[0, 1]`; the generator
//! scales the result onto a prediction interval.

/// Shape of a sampling policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingPolicyCurve {
    /// Identity over `[0, 1]`: constant sampling rate.
    Linear,
    /// Logistic curve over `[-5, 5]`: slow, fast, slow.
    Sigmoid { alpha: f64 },
}

impl SamplingPolicyCurve {
    /// Domain the curve is sampled over.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Self::Linear => (0.0, 1.0),
            Self::Sigmoid { .. } => (-5.0, 5.0),
        }
    }

    /// Evaluate the curve at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Sigmoid { alpha } => 1.0 / (1.0 + (-alpha * x).exp()),
        }
    }

    /// Steepest slope of the curve anywhere on `[start, end]`.
    pub fn max_slope(&self, start: f64, end: f64) -> f64 {
        match self {
            Self::Linear => 1.0,
            Self::Sigmoid { alpha } => {
                // The logistic curve is steepest at its inflection point
                let s = self.evaluate(0.0_f64.clamp(start, end));
                alpha * s * (1.0 - s)
            }
        }
    }
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}
