//! Controller errors.

use thiserror::Error;

use crate::sampling::CurveError;

/// Errors that stop a sampling run.
///
/// The visit variants mean the geofence and the visit store disagree about
/// where the subject is; they are never recovered from.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("departure from stay point {stay_point_id} but no visit is open there")]
    NoOpenVisit { stay_point_id: u32 },

    #[error("arrival at stay point {stay_point_id} but no earlier visit predicts the stay")]
    MissingOracleVisit { stay_point_id: u32 },

    #[error("invalid controller configuration: {0}")]
    Config(String),

    #[error("failed to build stay curve: {0}")]
    Curve(#[from] CurveError),
}
