//! In-memory stores for inferred stay points and visits.

mod stay_points;
mod visits;

pub use stay_points::{StayPointStore, DEFAULT_DEDUP_RADIUS_M};
pub use visits::VisitStore;
