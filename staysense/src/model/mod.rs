//! Mobility data model.
//!
//! Fixes are the raw input; stay points and visits are what the engine
//! infers from them.

mod fix;
mod outcome;
mod stay_point;
mod visit;

pub use fix::{Fix, DISPLAY_TIME_FORMAT};
pub use outcome::GeoFencingOutcome;
pub use stay_point::{LiveStayPoint, StayPoint};
pub use visit::Visit;
