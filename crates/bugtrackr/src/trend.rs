//! Daily submission trend over a trailing window.
//!
//! The series always has exactly `window_days` buckets, one per UTC calendar
//! day, ending today and zero-filled. It is recomputed from scratch whenever
//! the underlying bugs change; volumes are per user, so that is cheap.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

/// Window sizes offered to users
pub const WINDOW_PRESETS: [u32; 3] = [7, 14, 30];

/// Window used when none is chosen
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Bugs filed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    /// Calendar day (UTC), serialized as `YYYY-MM-DD`
    pub date: NaiveDate,

    /// Bugs created that day
    pub count: u64,
}

/// A zero-filled trailing window of daily counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    /// Buckets in ascending date order
    pub buckets: Vec<TrendBucket>,

    /// Sum of all bucket counts
    pub total: u64,
}

impl TrendSeries {
    /// Largest bucket count, for scaling a chart
    pub fn peak(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Bucket creation times into the `window_days` days ending today (UTC).
pub fn bucketize<I>(timestamps: I, window_days: u32) -> TrendSeries
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    bucketize_ending(timestamps, window_days, Utc::now().date_naive())
}

/// Bucket creation times into the `window_days` days ending on `today`.
///
/// Timestamps outside the window are ignored.
pub fn bucketize_ending<I>(timestamps: I, window_days: u32, today: NaiveDate) -> TrendSeries
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    if window_days == 0 {
        return TrendSeries {
            buckets: Vec::new(),
            total: 0,
        };
    }

    let start = today
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let mut buckets: Vec<TrendBucket> = start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| TrendBucket { date, count: 0 })
        .collect();

    for timestamp in timestamps {
        let day = timestamp.date_naive();
        if day < start || day > today {
            continue;
        }
        let offset = usize::try_from((day - start).num_days()).ok();
        if let Some(bucket) = offset.and_then(|i| buckets.get_mut(i)) {
            bucket.count += 1;
        }
    }

    let total = buckets.iter().map(|b| b.count).sum();
    TrendSeries { buckets, total }
}
