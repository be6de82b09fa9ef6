use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::{
    calendar::BusinessCalendar,
    error::{CalendarError, ReshapeResult},
    series::{Observation, Series, TimePoint},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketClosed {
    #[default]
    Both,
    Left,
    Right,
    Neither,
}

/// A time interval used as an aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalBucket {
    start: TimePoint,
    end: TimePoint,
    closed: BucketClosed,
}

impl IntervalBucket {
    pub fn new(start: TimePoint, end: TimePoint, closed: BucketClosed) -> Result<Self, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidInterval { start, end });
        }
        Ok(Self { start, end, closed })
    }

    /// `[anchor + from·B, anchor + to·B]` for business-day offsets `from`, `to`.
    pub fn from_business_offsets(
        calendar: &BusinessCalendar,
        anchor: NaiveDate,
        from: i32,
        to: i32,
        closed: BucketClosed,
    ) -> Result<Self, CalendarError> {
        let start = calendar.add_business_days(anchor, from)?;
        let end = calendar.add_business_days(anchor, to)?;
        Self::new(
            start.and_time(NaiveTime::MIN),
            end.and_time(NaiveTime::MIN),
            closed,
        )
    }

    /// `[marker - before·B, marker + after·B]`.
    pub fn around(
        calendar: &BusinessCalendar,
        marker: NaiveDate,
        before: u16,
        after: u16,
        closed: BucketClosed,
    ) -> Result<Self, CalendarError> {
        Self::from_business_offsets(
            calendar,
            marker,
            -i32::from(before),
            i32::from(after),
            closed,
        )
    }

    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    pub fn closed(&self) -> BucketClosed {
        self.closed
    }

    pub fn contains(&self, ts: TimePoint) -> bool {
        let after_start = match self.closed {
            BucketClosed::Both | BucketClosed::Left => ts >= self.start,
            BucketClosed::Right | BucketClosed::Neither => ts > self.start,
        };
        let before_end = match self.closed {
            BucketClosed::Both | BucketClosed::Right => ts <= self.end,
            BucketClosed::Left | BucketClosed::Neither => ts < self.end,
        };
        after_start && before_end
    }

    /// Index range of `sorted` that falls inside the bucket.
    fn slice<'a>(&self, sorted: &'a [Observation]) -> &'a [Observation] {
        let lo = sorted.partition_point(|o| o.timestamp < self.start);
        let hi = sorted.partition_point(|o| o.timestamp <= self.end);
        let mut window = &sorted[lo..hi.max(lo)];
        while let Some((first, rest)) = window.split_first() {
            if self.contains(first.timestamp) {
                break;
            }
            window = rest;
        }
        while let Some((last, rest)) = window.split_last() {
            if self.contains(last.timestamp) {
                break;
            }
            window = rest;
        }
        window
    }
}

impl fmt::Display for IntervalBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = match self.closed {
            BucketClosed::Both => ('[', ']'),
            BucketClosed::Left => ('[', ')'),
            BucketClosed::Right => ('(', ']'),
            BucketClosed::Neither => ('(', ')'),
        };
        let midnight = self.start.time() == NaiveTime::MIN && self.end.time() == NaiveTime::MIN;
        if midnight {
            write!(f, "{open}{}, {}{close}", self.start.date(), self.end.date())
        } else {
            write!(f, "{open}{}, {}{close}", self.start, self.end)
        }
    }
}

// ================================================================================================
// Aggregation
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketMean {
    pub bucket: IntervalBucket,

    /// `None` when no observation falls into the bucket.
    pub mean: Option<f64>,
    pub count: usize,
}

/// Mean of the observations inside each bucket, in bucket order.
///
/// Buckets may overlap; an observation counts towards every bucket that
/// contains it.
#[tracing::instrument(level = "debug", skip_all, fields(n = series.len(), buckets = buckets.len()))]
pub fn bucket_means(series: &Series, buckets: &[IntervalBucket]) -> Vec<BucketMean> {
    let sorted = series.sorted();
    buckets
        .iter()
        .map(|bucket| {
            let inside = bucket.slice(sorted.as_slice());
            let count = inside.len();
            let mean = (count > 0).then(|| inside.iter().map(|o| o.value).sum::<f64>() / count as f64);
            BucketMean {
                bucket: *bucket,
                mean,
                count,
            }
        })
        .collect()
}

/// Resamples onto business days, keeping the last observation of each bin.
///
/// A bin starts at a business day (midnight, inclusive) and runs up to the
/// next business day (exclusive), so weekend and holiday observations land in
/// the preceding business day's bin. Bins without observations are omitted.
pub fn resample_business_last(
    series: &Series,
    calendar: &BusinessCalendar,
) -> ReshapeResult<Series> {
    let sorted = series.sorted();
    let mut out = Series::default();
    for (label, group) in &sorted
        .iter()
        .chunk_by(|o| calendar.roll_backward(o.timestamp.date()))
    {
        let label = label?;
        if let Some(last) = group.last() {
            out.push(Observation::new(label.and_time(NaiveTime::MIN), last.value));
        }
    }
    debug!(input = series.len(), output = out.len(), "resampled to business days");
    Ok(out)
}
