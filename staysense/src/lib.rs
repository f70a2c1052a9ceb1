//! StaySense - stay point detection and adaptive GPS sampling.
//!
//! The library replays a GPS trace through a sampling controller that decides
//! how long to wait before asking for the next fix. Along the way it detects
//! stay points (places where the subject lingered), tracks arrivals and
//! departures with a windowed geofence, and records visits. When adaptive
//! sampling is on, the controller samples sparsely during stays it can
//! predict from earlier visits and densely around the expected departure.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geodesic`] | WGS84 distance between fixes |
//! | [`model`] | Fixes, stay points, visits and geofencing outcomes |
//! | [`detector`] | Stay point detection over a buffered run of fixes |
//! | [`geofence`] | Windowed arrival and departure voting |
//! | [`sampling`] | Sampling curves and schedules |
//! | [`store`] | Stay point and visit stores |
//! | [`source`] | Time-addressed fix sources |
//! | [`controller`] | The adaptive sampling loop |
//! | [`trajectory`] | Trajectory comparison against ground truth |
//! | [`ingest`] | CSV and JSON input/output |
//! | [`config`] | `~/.staysense/config.ini` |
//! | [`logging`] | Tracing subscriber setup |
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use staysense::controller::{AdaptiveSamplingController, ControllerConfig};
//! use staysense::model::Fix;
//! use staysense::source::FixStream;
//!
//! let start = NaiveDate::from_ymd_opt(2017, 4, 3)
//!     .unwrap()
//!     .and_hms_opt(9, 0, 0)
//!     .unwrap();
//! let fixes: Vec<Fix> = (0..120)
//!     .map(|i| Fix::new(19.4326, -99.1332, start + Duration::seconds(i * 30)))
//!     .collect();
//!
//! let source = FixStream::new(fixes).unwrap();
//! let mut controller = AdaptiveSamplingController::new(ControllerConfig::default(), source).unwrap();
//! let summary = controller.run().unwrap();
//!
//! assert_eq!(summary.stay_points, 1);
//! ```

pub mod config;
pub mod controller;
pub mod detector;
pub mod geodesic;
pub mod geofence;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sampling;
pub mod source;
pub mod store;
pub mod trajectory;

pub use controller::{AdaptiveSamplingController, ControllerConfig, ControllerError, RunSummary};
pub use model::{Fix, GeoFencingOutcome, LiveStayPoint, StayPoint, Visit};
