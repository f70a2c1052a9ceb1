//! Time-driven fix sources.
//!
//! The controller does not iterate fixes one by one: it asks for "the fix N
//! seconds after the previous request". A source answers with the reading
//! taken exactly at that time when there is one, and otherwise with the last
//! known position re-stamped at the requested time.

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::model::Fix;

/// Errors raised when building a fix source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fix source is empty")]
    Empty,

    #[error("fixes are not ordered by time: fix {index} at {timestamp} precedes its predecessor")]
    Unordered {
        index: usize,
        timestamp: NaiveDateTime,
    },
}

/// A source of fixes addressed by time offset.
pub trait FixSource {
    /// Earliest fix.
    fn first_fix(&self) -> &Fix;

    /// Latest fix.
    fn last_fix(&self) -> &Fix;

    /// Fix at `offset_secs` after the previous request.
    ///
    /// The first request is relative to the first fix, so an offset of 0
    /// yields the first fix. Returns `None` once the requested time is past
    /// the last fix.
    fn fix_at_or_after(&mut self, offset_secs: i64) -> Option<Fix>;
}

/// Fix source over an in-memory, time-ordered list of fixes.
#[derive(Debug, Clone)]
pub struct FixStream {
    fixes: Vec<Fix>,
    index: usize,
    time_pointer: NaiveDateTime,
}

impl FixStream {
    /// Create a stream over fixes sorted by timestamp.
    pub fn new(fixes: Vec<Fix>) -> Result<Self, SourceError> {
        let first = fixes.first().ok_or(SourceError::Empty)?.timestamp;

        if let Some(index) = fixes
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(SourceError::Unordered {
                index: index + 1,
                timestamp: fixes[index + 1].timestamp,
            });
        }

        Ok(Self {
            fixes,
            index: 0,
            time_pointer: first,
        })
    }

    /// Rewind to the first fix.
    pub fn reset(&mut self) {
        self.index = 0;
        self.time_pointer = self.fixes[0].timestamp;
    }

    /// All fixes held by the stream.
    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Number of fixes held by the stream.
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Always false: empty streams cannot be built.
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Time spanned by the stream, in seconds.
    pub fn time_length_secs(&self) -> i64 {
        (self.last_fix().timestamp - self.first_fix().timestamp).num_seconds()
    }
}

impl FixSource for FixStream {
    fn first_fix(&self) -> &Fix {
        &self.fixes[0]
    }

    fn last_fix(&self) -> &Fix {
        &self.fixes[self.fixes.len() - 1]
    }

    fn fix_at_or_after(&mut self, offset_secs: i64) -> Option<Fix> {
        if self.index >= self.fixes.len() {
            return None;
        }

        let target = self.time_pointer + Duration::seconds(offset_secs);
        while self.fixes[self.index].timestamp < target {
            self.index += 1;
            if self.index == self.fixes.len() {
                return None;
            }
        }

        self.time_pointer = target;
        let fix = &self.fixes[self.index];
        if fix.timestamp == target {
            Some(fix.clone())
        } else {
            Some(self.fixes[self.index.saturating_sub(1)].at_time(target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 4, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn stream() -> FixStream {
        FixStream::new(vec![
            Fix::new(19.0, -99.0, ts(0)),
            Fix::new(19.1, -99.0, ts(10)),
            Fix::new(19.2, -99.0, ts(60)),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_stream_is_rejected() {
        assert!(matches!(FixStream::new(vec![]), Err(SourceError::Empty)));
    }

    #[test]
    fn test_unordered_stream_is_rejected() {
        let result = FixStream::new(vec![
            Fix::new(19.0, -99.0, ts(10)),
            Fix::new(19.0, -99.0, ts(5)),
        ]);
        assert!(matches!(result, Err(SourceError::Unordered { index: 1, .. })));
    }

    #[test]
    fn test_zero_offset_yields_first_fix() {
        let mut s = stream();
        assert_eq!(s.fix_at_or_after(0), Some(Fix::new(19.0, -99.0, ts(0))));
    }

    #[test]
    fn test_exact_match_and_synthetic_fix() {
        let mut s = stream();
        s.fix_at_or_after(0);

        // Exact reading at +10 s
        let exact = s.fix_at_or_after(10).unwrap();
        assert_eq!(exact, Fix::new(19.1, -99.0, ts(10)));

        // Nothing at +40 s: last known position re-stamped
        let synthetic = s.fix_at_or_after(30).unwrap();
        assert_eq!(synthetic.latitude, 19.1);
        assert_eq!(synthetic.timestamp, ts(40));

        let last = s.fix_at_or_after(20).unwrap();
        assert_eq!(last, Fix::new(19.2, -99.0, ts(60)));
    }

    #[test]
    fn test_exhaustion() {
        let mut s = stream();
        s.fix_at_or_after(0);
        assert!(s.fix_at_or_after(61).is_none());
        assert!(s.fix_at_or_after(1).is_none());

        s.reset();
        assert_eq!(s.fix_at_or_after(0).map(|f| f.timestamp), Some(ts(0)));
    }

    #[test]
    fn test_first_and_last() {
        let s = stream();
        assert_eq!(s.first_fix().timestamp, ts(0));
        assert_eq!(s.last_fix().timestamp, ts(60));
        assert_eq!(s.time_length_secs(), 60);
        assert_eq!(s.len(), 3);
    }
}
