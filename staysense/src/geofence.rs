//! Windowed, vote-based geofencing.
//!
//! The geofence keeps a FIFO window of the last `window_size` fixes and, for
//! every registered stay point, a parallel history of raw distances and
//! inside/outside flags. Each new fix is judged at the window pivot
//! (`window_size / 2`) by comparing the votes of the sub-window before the
//! pivot (`old`) with the votes after it (`new`):
//!
//! ```text
//!   window:  [ f0  f1 | f2 | f3  f4 ]
//!              old     pivot  new
//! ```
//!
//! - **Arrival**: pivot inside, at least `threshold` outside votes in `old`
//!   and at least `threshold` inside votes in `new`. Before the window has
//!   ever been trimmed, a pivot inside with `threshold` inside votes in `old`
//!   also counts as an arrival, reported at the first window fix.
//! - **Departure**: pivot outside, at least `threshold` inside votes in `old`
//!   and at least `threshold` outside votes in `new`, while occupying a stay
//!   point.
//! - **Watchdog**: when neither fires but the pivot is outside the current
//!   stay point, no fix after the pivot is inside it and the newest fix is
//!   beyond the radius, a departure is forced.
//!
//! Stay points are checked in registration order and the first qualifying
//! one wins.

use std::collections::VecDeque;

use crate::geodesic::GeoPoint;
use crate::model::{Fix, GeoFencingOutcome, StayPoint};

/// Default inside radius (meters).
pub const DEFAULT_RADIUS_M: f64 = 250.0;

/// Default window capacity.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Configuration for [`WindowedGeoFencing`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFenceConfig {
    /// A fix strictly closer than this to a stay point is inside it.
    pub radius_m: f64,
    /// Window capacity. Odd sizes give a centered pivot.
    pub window_size: usize,
}

impl Default for GeoFenceConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Distance history of one registered stay point.
#[derive(Debug)]
struct StayPointTrack {
    stay_point: StayPoint,
    distances: VecDeque<f64>,
    inside: VecDeque<bool>,
}

/// Vote counts for one stay point at one pivot.
#[derive(Debug, Clone, Copy)]
struct Votes {
    old_inside: usize,
    old_len: usize,
    new_inside: usize,
    new_len: usize,
    pivot_inside: bool,
}

impl Votes {
    fn old_outside(&self) -> usize {
        self.old_len - self.old_inside
    }

    fn new_outside(&self) -> usize {
        self.new_len - self.new_inside
    }
}

impl StayPointTrack {
    fn votes(&self, pivot: usize) -> Votes {
        let old_len = pivot.min(self.inside.len());
        let old_inside = self.inside.iter().take(pivot).filter(|v| **v).count();
        let new_len = self.inside.len().saturating_sub(pivot + 1);
        let new_inside = self.inside.iter().skip(pivot + 1).filter(|v| **v).count();
        let pivot_inside = self.inside.get(pivot).copied().unwrap_or(false);

        Votes {
            old_inside,
            old_len,
            new_inside,
            new_len,
            pivot_inside,
        }
    }
}

/// Sliding-window geofence over a set of known stay points.
#[derive(Debug)]
pub struct WindowedGeoFencing {
    config: GeoFenceConfig,
    window: VecDeque<Fix>,
    tracks: Vec<StayPointTrack>,
    pivot: usize,
    trimmed_once: bool,
    current: Option<StayPoint>,
}

impl WindowedGeoFencing {
    /// Create a geofence with the given configuration.
    pub fn new(config: GeoFenceConfig) -> Self {
        if config.window_size % 2 == 0 {
            tracing::warn!(
                window_size = config.window_size,
                "Even geofence window: the pivot is off-center and regular arrivals cannot be voted"
            );
        }

        let pivot = config.window_size / 2;
        Self {
            window: VecDeque::with_capacity(config.window_size + 1),
            config,
            tracks: Vec::new(),
            pivot,
            trimmed_once: false,
            current: None,
        }
    }

    /// Create a geofence with the default radius and window.
    pub fn with_defaults() -> Self {
        Self::new(GeoFenceConfig::default())
    }

    /// Register a stay point.
    ///
    /// Its history is backfilled against every fix currently in the window,
    /// so a stay point registered late can be evaluated right away.
    pub fn introduce_new_stay_point(&mut self, stay_point: StayPoint) {
        let radius = self.config.radius_m;
        let distances: VecDeque<f64> = self
            .window
            .iter()
            .map(|fix| stay_point.distance_to(fix))
            .collect();
        let inside = distances.iter().map(|d| *d < radius).collect();

        tracing::debug!(
            stay_point = stay_point.id,
            backfilled = distances.len(),
            "Stay point registered in geofence"
        );

        self.tracks.push(StayPointTrack {
            stay_point,
            distances,
            inside,
        });
    }

    /// Feed one fix and evaluate at the default pivot.
    ///
    /// Returns `None` when no stay point is registered or the window is not
    /// yet long enough to hold the pivot.
    pub fn analyze_location(&mut self, fix: Fix) -> Option<GeoFencingOutcome> {
        self.analyze_location_at(fix, self.pivot)
    }

    /// Feed one fix and evaluate at an explicit pivot index.
    pub fn analyze_location_at(&mut self, fix: Fix, pivot: usize) -> Option<GeoFencingOutcome> {
        self.push_fix(fix.clone());
        self.trim_if_needed();

        if self.tracks.is_empty() || self.window.len() <= pivot {
            return None;
        }
        Some(self.evaluate(fix, pivot))
    }

    /// Stay point the subject currently occupies.
    pub fn current_stay_point(&self) -> Option<&StayPoint> {
        self.current.as_ref()
    }

    /// Number of fixes in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Default pivot index.
    pub fn pivot(&self) -> usize {
        self.pivot
    }

    /// Number of registered stay points.
    pub fn stay_point_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the window has dropped a fix at least once.
    pub fn trimmed_once(&self) -> bool {
        self.trimmed_once
    }

    /// Get the active configuration.
    pub fn config(&self) -> &GeoFenceConfig {
        &self.config
    }

    /// Length of a stay point's history (equals the window length).
    pub fn history_len(&self, stay_point_id: u32) -> Option<usize> {
        self.track(stay_point_id).map(|t| t.inside.len())
    }

    fn track(&self, stay_point_id: u32) -> Option<&StayPointTrack> {
        self.tracks.iter().find(|t| t.stay_point.id == stay_point_id)
    }

    fn push_fix(&mut self, fix: Fix) {
        let radius = self.config.radius_m;
        for track in &mut self.tracks {
            let distance = track.stay_point.distance_to(&fix);
            track.distances.push_back(distance);
            track.inside.push_back(distance < radius);
        }
        self.window.push_back(fix);
    }

    fn trim_if_needed(&mut self) {
        if self.window.len() <= self.config.window_size {
            return;
        }

        self.trimmed_once = true;
        self.window.pop_front();
        for track in &mut self.tracks {
            track.distances.pop_front();
            track.inside.pop_front();
        }
    }

    fn is_current(&self, stay_point: &StayPoint) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.id == stay_point.id)
    }

    fn evaluate(&mut self, detection_fix: Fix, pivot: usize) -> GeoFencingOutcome {
        let threshold = self.config.window_size / 2;
        let pivot_fix = self.window[pivot].clone();

        let arrival = self.check_arrival(pivot, threshold);
        let departure = self.check_departure(pivot, threshold);

        match (arrival, departure) {
            (Some((to, event_fix)), Some(from)) => {
                tracing::debug!(from = from.id, to = to.id, "Geofence: leaving and arriving");
                self.current = Some(to.clone());
                GeoFencingOutcome::LeavingAndArriving {
                    from,
                    to,
                    event_fix,
                    detection_fix,
                }
            }
            (Some((stay_point, event_fix)), None) => {
                tracing::debug!(stay_point = stay_point.id, "Geofence: arriving");
                self.current = Some(stay_point.clone());
                GeoFencingOutcome::Arriving {
                    stay_point,
                    event_fix,
                    detection_fix,
                }
            }
            (None, Some(stay_point)) => {
                tracing::debug!(stay_point = stay_point.id, "Geofence: leaving");
                self.current = None;
                GeoFencingOutcome::Leaving {
                    stay_point,
                    event_fix: pivot_fix,
                    detection_fix,
                }
            }
            (None, None) => match self.watchdog_barks(pivot) {
                Some(stay_point) => {
                    tracing::warn!(
                        stay_point = stay_point.id,
                        at = %pivot_fix.timestamp,
                        "Geofence watchdog forced a departure"
                    );
                    self.current = None;
                    GeoFencingOutcome::Leaving {
                        stay_point,
                        event_fix: pivot_fix,
                        detection_fix,
                    }
                }
                None => GeoFencingOutcome::NoChange {
                    current: self.current.clone(),
                    event_fix: pivot_fix,
                    detection_fix,
                },
            },
        }
    }

    /// First stay point the subject arrives at, with the arrival fix.
    fn check_arrival(&self, pivot: usize, threshold: usize) -> Option<(StayPoint, Fix)> {
        for track in &self.tracks {
            let votes = track.votes(pivot);
            if !votes.pivot_inside {
                continue;
            }

            let event_index = if votes.old_outside() >= threshold && votes.new_inside >= threshold {
                pivot
            } else if votes.old_inside >= threshold && !self.trimmed_once {
                // Stream started inside the stay point
                0
            } else {
                continue;
            };

            if !self.is_current(&track.stay_point) {
                return Some((track.stay_point.clone(), self.window[event_index].clone()));
            }
        }
        None
    }

    /// First stay point the subject departs from.
    fn check_departure(&self, pivot: usize, threshold: usize) -> Option<StayPoint> {
        self.current.as_ref()?;

        self.tracks
            .iter()
            .find(|track| {
                let votes = track.votes(pivot);
                !votes.pivot_inside
                    && votes.old_inside >= threshold
                    && votes.new_outside() >= threshold
            })
            .map(|track| track.stay_point.clone())
    }

    fn watchdog_barks(&self, pivot: usize) -> Option<StayPoint> {
        let current = self.current.as_ref()?;
        let track = self.track(current.id)?;
        let votes = track.votes(pivot);
        let last_distance = track.distances.back().copied()?;

        if !votes.pivot_inside && votes.new_inside == 0 && last_distance > self.config.radius_m {
            Some(current.clone())
        } else {
            None
        }
    }
}
