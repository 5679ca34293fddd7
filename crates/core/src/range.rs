//! Date ranges for reporting queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Half-open UTC time range `[start, end)` used for attribution and
/// reporting queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("range start must not be after end"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

impl ValueObject for DateRange {}

/// Whole days elapsed from `from` to `to`, floored.
///
/// Negative when `to` precedes `from`.
pub fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_inverted_range() {
        let now = Utc::now();
        let err = DateRange::new(now, now - Duration::hours(1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn contains_is_half_open() {
        let start = Utc::now();
        let end = start + Duration::days(7);
        let range = DateRange::new(start, end).unwrap();

        assert!(range.contains(start));
        assert!(range.contains(end - Duration::seconds(1)));
        assert!(!range.contains(end));
    }

    #[test]
    fn whole_days_floor() {
        let start = Utc::now();
        assert_eq!(whole_days_between(start, start + Duration::hours(47)), 1);
        assert_eq!(whole_days_between(start, start + Duration::hours(23)), 0);
    }
}
