//! Deduplicating stay point store.

use crate::geodesic::GeoPoint;
use crate::model::{LiveStayPoint, StayPoint};

/// Default radius under which two stay points are the same place (meters).
pub const DEFAULT_DEDUP_RADIUS_M: f64 = 500.0;

/// In-memory stay point store.
///
/// A candidate closer than the dedup radius to any stored stay point is
/// rejected. Accepted stay points get dense 1-based ids in insertion order.
#[derive(Debug)]
pub struct StayPointStore {
    dedup_radius_m: f64,
    stay_points: Vec<StayPoint>,
}

impl Default for StayPointStore {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_RADIUS_M)
    }
}

impl StayPointStore {
    /// Create an empty store.
    pub fn new(dedup_radius_m: f64) -> Self {
        Self {
            dedup_radius_m,
            stay_points: Vec::new(),
        }
    }

    /// Register a candidate.
    ///
    /// Returns the stored stay point, or `None` when an existing one lies
    /// within the dedup radius. The new stay point starts with one visit:
    /// the run the candidate was built from.
    pub fn add(&mut self, candidate: &LiveStayPoint) -> Option<StayPoint> {
        if let Some(existing) = self.nearest_within_radius(candidate) {
            tracing::debug!(
                existing = existing.id,
                latitude = candidate.latitude,
                longitude = candidate.longitude,
                "Stay point already known"
            );
            return None;
        }

        let mut stay_point = StayPoint::from(candidate);
        stay_point.id = self.stay_points.len() as u32 + 1;
        stay_point.visit_count = 1;
        self.stay_points.push(stay_point.clone());

        tracing::info!(
            id = stay_point.id,
            latitude = stay_point.latitude,
            longitude = stay_point.longitude,
            "Stay point registered"
        );
        Some(stay_point)
    }

    /// Count one more visit at a stay point.
    pub fn record_visit(&mut self, stay_point_id: u32) -> Option<&StayPoint> {
        let stay_point = self.get_mut(stay_point_id)?;
        stay_point.visit_count += 1;
        Some(stay_point)
    }

    /// Look up a stay point by id.
    pub fn get(&self, stay_point_id: u32) -> Option<&StayPoint> {
        let index = (stay_point_id as usize).checked_sub(1)?;
        self.stay_points.get(index)
    }

    /// All stay points in insertion order.
    pub fn get_all(&self) -> &[StayPoint] {
        &self.stay_points
    }

    /// Number of stay points.
    pub fn len(&self) -> usize {
        self.stay_points.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.stay_points.is_empty()
    }

    /// Dedup radius in meters.
    pub fn dedup_radius_m(&self) -> f64 {
        self.dedup_radius_m
    }

    fn get_mut(&mut self, stay_point_id: u32) -> Option<&mut StayPoint> {
        let index = (stay_point_id as usize).checked_sub(1)?;
        self.stay_points.get_mut(index)
    }

    fn nearest_within_radius<P: GeoPoint>(&self, point: &P) -> Option<&StayPoint> {
        self.stay_points
            .iter()
            .map(|sp| (sp, point.distance_to(sp)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|(_, distance)| *distance < self.dedup_radius_m)
            .map(|(sp, _)| sp)
    }
}
