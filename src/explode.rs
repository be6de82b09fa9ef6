//! Exploding time spans into fixed-width sub-interval records.
//!
//! Buckets are aligned to the Unix epoch grid and labelled by their end:
//! the bucket labelled `L` covers `(L - width, L]`. A span contributes one
//! record per bucket from `ceil(start)` to `ceil(end)`, carrying the overlap
//! of the bucket with the span as its duration.

use std::{collections::BTreeMap, iter};

use chrono::{DateTime, Duration, TimeDelta};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::{
    error::{DataError, ReshapeResult, WindowError},
    series::TimePoint,
    window::WindowOffset,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    pub event_id: String,
    pub start: TimePoint,
    pub end: TimePoint,
}

impl Span {
    pub fn new(
        id: impl Into<String>,
        event_id: impl Into<String>,
        start: TimePoint,
        end: TimePoint,
    ) -> Result<Self, DataError> {
        let span = Self {
            id: id.into(),
            event_id: event_id.into(),
            start,
            end,
        };
        span.validate()?;
        Ok(span)
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.start > self.end {
            return Err(DataError::InvalidSpan {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

/// One bucket's share of a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubInterval {
    pub id: String,
    pub event_id: String,

    /// End of the bucket, i.e. the epoch-aligned ceiling.
    pub bucket_end: TimePoint,
    pub duration: Duration,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpansionStrategy {
    /// Each row yields a lazy `(label, duration)` iterator pushed straight
    /// into the output.
    #[default]
    FlatRecords,

    /// Each row materializes a `BTreeMap<label, duration>`; the maps are
    /// stacked into records afterwards.
    PerRowMap,
}

/// Explodes every span into bucket records of `width`.
///
/// Each record carries the overlap of its bucket with the span, so a span
/// inside a single bucket gets `end - start` rather than the bucket remainder.
#[tracing::instrument(level = "debug", skip(spans), fields(rows = spans.len(), width = %width))]
pub fn explode_spans(
    spans: &[Span],
    width: WindowOffset,
    strategy: ExpansionStrategy,
) -> ReshapeResult<Vec<SubInterval>> {
    let out = match strategy {
        ExpansionStrategy::FlatRecords => explode_flat(spans, width)?,
        ExpansionStrategy::PerRowMap => explode_per_row_map(spans, width)?,
    };
    debug!(records = out.len(), "spans exploded");
    Ok(out)
}

fn explode_flat(spans: &[Span], width: WindowOffset) -> ReshapeResult<Vec<SubInterval>> {
    let mut out = Vec::with_capacity(spans.len() * 2);
    for span in spans {
        for (bucket_end, duration) in span_buckets(span, width)? {
            out.push(SubInterval {
                id: span.id.clone(),
                event_id: span.event_id.clone(),
                bucket_end,
                duration,
            });
        }
    }
    Ok(out)
}

fn explode_per_row_map(spans: &[Span], width: WindowOffset) -> ReshapeResult<Vec<SubInterval>> {
    let maps = spans
        .iter()
        .map(|span| -> ReshapeResult<BTreeMap<_, _>> { Ok(span_buckets(span, width)?.collect()) })
        .collect::<ReshapeResult<Vec<_>>>()?;

    Ok(spans
        .iter()
        .zip(maps)
        .flat_map(|(span, map)| {
            map.into_iter().map(move |(bucket_end, duration)| SubInterval {
                id: span.id.clone(),
                event_id: span.event_id.clone(),
                bucket_end,
                duration,
            })
        })
        .collect())
}

/// Bucket labels and overlap durations for one span.
fn span_buckets(
    span: &Span,
    width: WindowOffset,
) -> ReshapeResult<impl Iterator<Item = (TimePoint, Duration)> + '_> {
    span.validate()?;
    let w = width.duration();
    let first = ceil_to_grid(span.start, width)?;
    let last = ceil_to_grid(span.end, width)?;

    Ok(iter::successors(Some(first), move |&label| {
        label.checked_add_signed(w).filter(|next| *next <= last)
    })
    .map(move |label| {
        let lo = (label - w).max(span.start);
        let hi = label.min(span.end);
        (label, (hi - lo).max(TimeDelta::zero()))
    }))
}

/// Smallest epoch-aligned multiple of `width` that is `>= ts`.
///
/// The grid is laid out in nanoseconds, so widths such as `1500us` stay exact.
pub fn ceil_to_grid(ts: TimePoint, width: WindowOffset) -> ReshapeResult<TimePoint> {
    let out_of_range = || WindowError::ShiftOutOfRange(ts);
    let w = width.duration().num_nanoseconds().ok_or_else(out_of_range)?;
    let ns = ts.and_utc().timestamp_nanos_opt().ok_or_else(out_of_range)?;
    let rem = ns.rem_euclid(w);
    if rem == 0 {
        return Ok(ts);
    }
    let ceil = (ns - rem).checked_add(w).ok_or_else(out_of_range)?;
    Ok(DateTime::from_timestamp_nanos(ceil).naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32, m: u32, s: u32, ms: u32) -> TimePoint {
        NaiveDate::from_ymd_opt(2017, 10, 16)
            .unwrap()
            .and_time(NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap())
    }

    fn ten_min() -> WindowOffset {
        "10min".parse().unwrap()
    }

    #[test]
    fn ceil_aligns_to_epoch_grid() {
        assert_eq!(ceil_to_grid(t(6, 3, 37, 440), ten_min()).unwrap(), t(6, 10, 0, 0));
        assert_eq!(ceil_to_grid(t(6, 10, 0, 0), ten_min()).unwrap(), t(6, 10, 0, 0));
        assert_eq!(ceil_to_grid(t(6, 10, 0, 1), ten_min()).unwrap(), t(6, 20, 0, 0));
    }

    #[test]
    fn multi_bucket_span_splits_first_middle_last() {
        let span = Span::new("G01", "1001", t(6, 3, 37, 440), t(6, 24, 24, 440)).unwrap();
        let got: Vec<_> = span_buckets(&span, ten_min()).unwrap().collect();
        assert_eq!(
            got,
            vec![
                (t(6, 10, 0, 0), Duration::milliseconds(382_560)),
                (t(6, 20, 0, 0), Duration::minutes(10)),
                (t(6, 30, 0, 0), Duration::milliseconds(264_440)),
            ]
        );
    }

    #[test]
    fn span_inside_one_bucket_keeps_its_length() {
        let span = Span::new("G09", "1001", t(6, 1, 0, 0), t(6, 5, 0, 0)).unwrap();
        let got: Vec<_> = span_buckets(&span, ten_min()).unwrap().collect();
        assert_eq!(got, vec![(t(6, 10, 0, 0), Duration::minutes(4))]);
    }

    #[test]
    fn aligned_edges() {
        // Starting on the grid opens with an empty bucket; ending on it
        // closes with a full one.
        let span = Span::new("G10", "1001", t(6, 10, 0, 0), t(6, 30, 0, 0)).unwrap();
        let got: Vec<_> = span_buckets(&span, ten_min()).unwrap().collect();
        assert_eq!(
            got,
            vec![
                (t(6, 10, 0, 0), Duration::zero()),
                (t(6, 20, 0, 0), Duration::minutes(10)),
                (t(6, 30, 0, 0), Duration::minutes(10)),
            ]
        );
    }

    fn t_us(h: u32, m: u32, s: u32, us: u32) -> TimePoint {
        NaiveDate::from_ymd_opt(2017, 10, 16)
            .unwrap()
            .and_time(NaiveTime::from_hms_micro_opt(h, m, s, us).unwrap())
    }

    #[test]
    fn ceil_keeps_sub_millisecond_widths_exact() {
        let w: WindowOffset = "1500us".parse().unwrap();
        assert_eq!(ceil_to_grid(t_us(6, 0, 0, 1_000), w).unwrap(), t_us(6, 0, 0, 1_500));
        assert_eq!(ceil_to_grid(t_us(6, 0, 0, 3_000), w).unwrap(), t_us(6, 0, 0, 3_000));

        let w: WindowOffset = "500us".parse().unwrap();
        assert_eq!(ceil_to_grid(t_us(6, 0, 0, 1_001), w).unwrap(), t_us(6, 0, 0, 1_500));
    }

    #[test]
    fn fractional_millisecond_width_covers_the_whole_span() {
        let span = Span::new("G13", "1001", t(6, 0, 0, 1), t(6, 0, 0, 11)).unwrap();
        let w: WindowOffset = "1500us".parse().unwrap();
        let got: Vec<_> = span_buckets(&span, w).unwrap().collect();

        let labels: Vec<_> = got.iter().map(|(label, _)| *label).collect();
        let want: Vec<_> = (1..=8).map(|i| t_us(6, 0, 0, 1_500 * i)).collect();
        assert_eq!(labels, want);

        assert_eq!(got[0].1, Duration::microseconds(500));
        assert!(got[1..7].iter().all(|(_, d)| *d == Duration::microseconds(1_500)));
        assert_eq!(got[7].1, Duration::microseconds(500));
        let total = got.iter().fold(Duration::zero(), |acc, (_, d)| acc + *d);
        assert_eq!(total, span.length());
    }

    #[test]
    fn sub_millisecond_width_does_not_panic() {
        let span = Span::new("G14", "1001", t(6, 0, 0, 1), t(6, 0, 0, 3)).unwrap();
        let w: WindowOffset = "500us".parse().unwrap();
        for strategy in [ExpansionStrategy::FlatRecords, ExpansionStrategy::PerRowMap] {
            let records = explode_spans(std::slice::from_ref(&span), w, strategy).unwrap();
            assert_eq!(records.len(), 5);
            assert_eq!(records[0].duration, Duration::zero());
            let total = records.iter().fold(Duration::zero(), |acc, r| acc + r.duration);
            assert_eq!(total, Duration::milliseconds(2));
        }
    }

    #[test]
    fn reversed_span_is_rejected() {
        let err = Span::new("G11", "1001", t(7, 0, 0, 0), t(6, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, DataError::InvalidSpan { .. }));

        let raw = Span {
            id: "G12".into(),
            event_id: "1001".into(),
            start: t(7, 0, 0, 0),
            end: t(6, 0, 0, 0),
        };
        assert!(explode_spans(&[raw], ten_min(), ExpansionStrategy::FlatRecords).is_err());
    }
}
