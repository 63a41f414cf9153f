//! Aggregations behind the analytics endpoints
//!
//! Handlers fetch the rows for a date range and hand them to these pure
//! functions, so the numbers can be tested without a database.

pub mod earnings;
pub mod payments;
pub mod reviews;

pub use earnings::*;
pub use payments::*;
pub use reviews::*;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::util::millis_to_datetime;

/// Time bucket width for series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Day,
    Week,
    #[default]
    Month,
}

impl Bucket {
    /// First day of the bucket containing `ms`. Weeks start on Monday.
    pub fn start_of(&self, ms: i64) -> NaiveDate {
        let date = millis_to_datetime(ms).date_naive();
        match self {
            Self::Day => date,
            Self::Week => {
                date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Whole buckets from `origin` to `start`, both bucket starts.
    /// Empty buckets in between still count.
    pub fn offset(&self, origin: NaiveDate, start: NaiveDate) -> i64 {
        match self {
            Self::Day => (start - origin).num_days(),
            Self::Week => (start - origin).num_days() / 7,
            Self::Month => {
                i64::from(start.year() - origin.year()) * 12
                    + i64::from(start.month()) - i64::from(origin.month())
            }
        }
    }
}

/// Series points keyed by bucket offset from the first start
pub(crate) fn offset_points(
    bucket: Bucket,
    series: impl IntoIterator<Item = (NaiveDate, f64)>,
) -> Vec<(f64, f64)> {
    let mut origin = None;
    series
        .into_iter()
        .map(|(start, y)| {
            let first = *origin.get_or_insert(start);
            (bucket.offset(first, start) as f64, y)
        })
        .collect()
}

/// Inclusive millisecond range from query parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl DateRange {
    pub fn contains(&self, ms: i64) -> bool {
        self.from.is_none_or(|f| ms >= f) && self.to.is_none_or(|t| ms <= t)
    }

    pub fn from_or_min(&self) -> i64 {
        self.from.unwrap_or(0)
    }

    pub fn to_or_max(&self) -> i64 {
        self.to.unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn bucket_starts() {
        // Thursday 2025-03-13
        let ms = Utc
            .with_ymd_and_hms(2025, 3, 13, 22, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(Bucket::Day.start_of(ms), NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
        assert_eq!(Bucket::Week.start_of(ms), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(Bucket::Month.start_of(ms), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn offsets_count_empty_buckets() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(Bucket::Month.offset(d(2024, 11, 1), d(2025, 2, 1)), 3);
        assert_eq!(Bucket::Week.offset(d(2025, 3, 3), d(2025, 3, 24)), 3);
        assert_eq!(Bucket::Day.offset(d(2025, 2, 27), d(2025, 3, 2)), 3);

        let points = offset_points(Bucket::Month, [(d(2025, 1, 1), 1.0), (d(2025, 3, 1), 3.0)]);
        assert_eq!(points, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn open_ranges() {
        let range = DateRange { from: Some(10), to: None };
        assert!(range.contains(10));
        assert!(!range.contains(9));
        assert!(range.contains(i64::MAX));
    }
}
