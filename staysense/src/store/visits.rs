//! Append-only visit store.

use std::collections::HashMap;

use crate::model::{Fix, Visit};

/// In-memory visit store.
///
/// Visits are never removed. Two indexes are kept per stay point: the first
/// visit ever recorded (its dwell serves as the predicted stay length) and
/// the visit currently open, if any.
#[derive(Debug, Default)]
pub struct VisitStore {
    visits: Vec<Visit>,
    first: HashMap<u32, usize>,
    open: HashMap<u32, usize>,
}

impl VisitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visit and assign its id.
    ///
    /// A visit whose arrival and departure pivots coincide is tracked as
    /// the open visit of its stay point.
    pub fn add(&mut self, mut visit: Visit) -> &Visit {
        let index = self.visits.len();
        visit.id = index as u32 + 1;

        let stay_point_id = visit.stay_point_id;
        self.first.entry(stay_point_id).or_insert(index);
        if visit.is_open() {
            if let Some(previous) = self.open.insert(stay_point_id, index) {
                tracing::warn!(
                    stay_point = stay_point_id,
                    previous_visit = previous + 1,
                    "Opening a visit while another one is still open"
                );
            }
        }

        self.visits.push(visit);
        &self.visits[index]
    }

    /// Close the visit at `index` with the given departure fixes.
    pub fn update_at(&mut self, index: usize, pivot: Fix, detection: Fix) -> Option<&Visit> {
        let visit = self.visits.get_mut(index)?;
        visit.close(pivot, detection);

        let stay_point_id = visit.stay_point_id;
        if self.open.get(&stay_point_id) == Some(&index) {
            self.open.remove(&stay_point_id);
        }
        self.visits.get(index)
    }

    /// Close the open visit of a stay point.
    ///
    /// Returns `None` when the stay point has no open visit.
    pub fn close_open(&mut self, stay_point_id: u32, pivot: Fix, detection: Fix) -> Option<&Visit> {
        let index = *self.open.get(&stay_point_id)?;
        self.update_at(index, pivot, detection)
    }

    /// Close the most recent visit if it is still open.
    pub fn close_last_if_open(&mut self, fix: &Fix) -> Option<&Visit> {
        let index = self.visits.len().checked_sub(1)?;
        if !self.visits[index].is_open() {
            return None;
        }
        self.update_at(index, fix.clone(), fix.clone())
    }

    /// Open visit of a stay point.
    pub fn open_for(&self, stay_point_id: u32) -> Option<&Visit> {
        self.open.get(&stay_point_id).map(|i| &self.visits[*i])
    }

    /// First visit ever recorded at a stay point.
    pub fn first_for(&self, stay_point_id: u32) -> Option<&Visit> {
        self.first.get(&stay_point_id).map(|i| &self.visits[*i])
    }

    /// Most recent visit.
    pub fn last(&self) -> Option<&Visit> {
        self.visits.last()
    }

    /// All visits in insertion order.
    pub fn get_all(&self) -> &[Visit] {
        &self.visits
    }

    /// Number of visits.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn fix_at(minutes: i64) -> Fix {
        let t = NaiveDate::from_ymd_opt(2017, 4, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Fix::new(19.0, -99.0, t + Duration::minutes(minutes))
    }

    #[test]
    fn test_ids_and_first_visit_index() {
        let mut store = VisitStore::new();
        store.add(Visit::new(1, fix_at(0), fix_at(50), fix_at(0), fix_at(50)));
        store.add(Visit::opened(1, fix_at(120), fix_at(121)));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_all()[1].id, 2);
        assert_eq!(store.first_for(1).map(|v| v.id), Some(1));
        assert_eq!(store.open_for(1).map(|v| v.id), Some(2));
        assert!(store.first_for(2).is_none());
    }

    #[test]
    fn test_registration_visit_is_not_open() {
        let mut store = VisitStore::new();
        store.add(Visit::new(1, fix_at(0), fix_at(50), fix_at(0), fix_at(50)));
        assert!(store.open_for(1).is_none());
        assert!(store.close_open(1, fix_at(60), fix_at(61)).is_none());
    }

    #[test]
    fn test_close_open_visit() {
        let mut store = VisitStore::new();
        store.add(Visit::opened(3, fix_at(0), fix_at(1)));

        let closed = store.close_open(3, fix_at(40), fix_at(42)).unwrap();
        assert_eq!(closed.stay_time_seconds(), 2400);
        assert!(store.open_for(3).is_none());
    }

    #[test]
    fn test_close_last_if_open() {
        let mut store = VisitStore::new();
        assert!(store.close_last_if_open(&fix_at(10)).is_none());

        store.add(Visit::opened(1, fix_at(0), fix_at(1)));
        let closed = store.close_last_if_open(&fix_at(10)).unwrap();
        assert_eq!(closed.stay_time_seconds(), 600);
        assert!(store.open_for(1).is_none());

        // Already closed
        assert!(store.close_last_if_open(&fix_at(20)).is_none());
    }
}
