//! Forward-looking rolling aggregates over a ragged timestamp index.
//!
//! The reference formulation turns a forward window into a backward one:
//! every timestamp `t` is shifted to `t + offset`, the series is reindexed onto
//! the union of original and shifted timestamps (absent slots contribute
//! nothing), a backward rolling aggregate of width `offset` is taken, and the
//! value at `t + offset` is read back for `t`.
//!
//! With [`ClosedWindow::Left`] the backward window at `p` is `[p - offset, p)`,
//! so reading at `p = t + offset` yields the forward window `[t, t + offset)`.
//! With [`ClosedWindow::Right`] the backward window is `(p - offset, p]`,
//! yielding `(t, t + offset]`.

use chrono::Duration;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    error::{ReshapeResult, WindowError},
    series::{Observation, ResultSeries, Series, TimePoint},
    window::{ClosedWindow, RollingConfig, RollingStrategy, WindowOffset},
};

/// Forward rolling sum with the default (left-closed) window.
///
/// Fails with [`WindowError::InvalidOffset`] before doing any work if
/// `offset` is not strictly positive.
///
/// # Example
/// ```
/// # use tsreshape::prelude::*;
/// # use chrono::{Duration, NaiveDate};
/// let t0 = NaiveDate::from_ymd_opt(2018, 4, 23).unwrap().and_hms_milli_opt(6, 45, 13, 379).unwrap();
/// let series = Series::from_pairs([
///     (t0, -0.08),
///     (t0 + Duration::milliseconds(1), -0.05),
///     (t0 + Duration::milliseconds(20), 1.0),
/// ]);
/// let out = compute_forward_rolling_sum(&series, Duration::milliseconds(10)).unwrap();
/// assert!((out.get(t0).unwrap().unwrap() - (-0.13)).abs() < 1e-12);
/// assert!(compute_forward_rolling_sum(&series, Duration::zero()).is_err());
/// ```
pub fn compute_forward_rolling_sum(series: &Series, offset: Duration) -> ReshapeResult<ResultSeries> {
    let offset = WindowOffset::new(offset)?;
    forward_rolling(series, &RollingConfig::new(offset))
}

/// Forward rolling aggregate as described by `cfg`.
///
/// The result holds exactly one entry per input observation, ordered by
/// timestamp. A window without any observation yields `None`.
#[tracing::instrument(
    level = "debug",
    skip(series),
    fields(
        n = series.len(),
        offset = %cfg.offset,
        closed = %cfg.closed,
        agg = %cfg.aggregation,
        strategy = %cfg.strategy
    )
)]
pub fn forward_rolling(series: &Series, cfg: &RollingConfig) -> ReshapeResult<ResultSeries> {
    if series.is_empty() {
        return Ok(ResultSeries::default());
    }

    let sorted = series.sorted();
    match cfg.strategy {
        RollingStrategy::AugmentedIndex => augmented_forward(sorted.as_slice(), cfg),
        RollingStrategy::TwoPointer => Ok(two_pointer_forward(sorted.as_slice(), cfg)),
    }
}

impl Series {
    /// Shorthand for [`forward_rolling`] with a sum over the default window.
    pub fn forward_rolling_sum(&self, offset: WindowOffset) -> ReshapeResult<ResultSeries> {
        forward_rolling(self, &RollingConfig::new(offset))
    }
}

// ================================================================================================
// Augmented Index
// ================================================================================================

/// Sorted, deduplicated union of all timestamps and all timestamps shifted
/// forward by `offset`.
pub fn augmented_index(series: &Series, offset: WindowOffset) -> ReshapeResult<Vec<TimePoint>> {
    let sorted = series.sorted();
    build_augmented_index(sorted.as_slice(), offset)
}

fn build_augmented_index(
    sorted: &[Observation],
    offset: WindowOffset,
) -> ReshapeResult<Vec<TimePoint>> {
    let shifted = sorted
        .iter()
        .map(|o| {
            offset
                .shift(o.timestamp)
                .ok_or(WindowError::ShiftOutOfRange(o.timestamp))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sorted
        .iter()
        .map(|o| o.timestamp)
        .merge(shifted)
        .dedup()
        .collect())
}

/// One row of the reindexed series.
#[derive(Debug, Clone, Copy)]
struct Slot {
    timestamp: TimePoint,
    value: f64,
    /// Number of real observations behind `value`: 0 for fill, else 1.
    count: usize,
}

/// Reindexes sorted observations onto `index`.
///
/// Missing keys become a zero-valued, zero-count slot. When several
/// observations share a key, the last one in sorted order wins and the
/// others are dropped.
fn reindex(sorted: &[Observation], index: &[TimePoint]) -> Vec<Slot> {
    let mut obs = sorted.iter().peekable();
    index
        .iter()
        .map(|&timestamp| {
            let mut slot = Slot {
                timestamp,
                value: 0.0,
                count: 0,
            };
            while let Some(o) = obs.next_if(|o| o.timestamp <= timestamp) {
                if o.timestamp == timestamp {
                    slot.value = o.value;
                    slot.count = 1;
                }
            }
            slot
        })
        .collect()
}

/// Backward rolling `(sum, count)` for every slot.
fn backward_rolling(slots: &[Slot], width: Duration, closed: ClosedWindow) -> Vec<(f64, usize)> {
    let mut out = Vec::with_capacity(slots.len());
    let (mut lo, mut hi) = (0usize, 0usize);
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, slot) in slots.iter().enumerate() {
        let end = match closed {
            ClosedWindow::Left => i,
            ClosedWindow::Right => i + 1,
        };
        while hi < end {
            sum += slots[hi].value;
            count += slots[hi].count;
            hi += 1;
        }

        if let Some(start) = slot.timestamp.checked_sub_signed(width) {
            while lo < hi && !within_trailing_edge(closed, slots[lo].timestamp, start) {
                sum -= slots[lo].value;
                count -= slots[lo].count;
                lo += 1;
            }
        }

        if count == 0 {
            // Drop accumulated rounding residue once the window is empty.
            sum = 0.0;
        }
        out.push((sum, count));
    }

    out
}

#[inline]
fn within_trailing_edge(closed: ClosedWindow, ts: TimePoint, start: TimePoint) -> bool {
    match closed {
        ClosedWindow::Left => ts >= start,
        ClosedWindow::Right => ts > start,
    }
}

/// Index of `key` in `index`, or of its nearest neighbour if absent.
fn nearest_position(index: &[TimePoint], key: TimePoint) -> ReshapeResult<usize> {
    match index.binary_search(&key) {
        Ok(pos) => Ok(pos),
        Err(pos) => {
            let before = pos.checked_sub(1);
            let after = (pos < index.len()).then_some(pos);
            let nearest = match (before, after) {
                (Some(b), Some(a)) => {
                    if key - index[b] <= index[a] - key {
                        b
                    } else {
                        a
                    }
                }
                (Some(b), None) => b,
                (None, Some(a)) => a,
                (None, None) => return Err(WindowError::LookupFailed(key).into()),
            };
            trace!(%key, matched = %index[nearest], "nearest-match fallback");
            Ok(nearest)
        }
    }
}

fn augmented_forward(sorted: &[Observation], cfg: &RollingConfig) -> ReshapeResult<ResultSeries> {
    let index = build_augmented_index(sorted, cfg.offset)?;
    let slots = reindex(sorted, &index);
    let rolled = backward_rolling(&slots, cfg.offset.duration(), cfg.closed);
    debug!(
        observations = sorted.len(),
        augmented = index.len(),
        "augmented index built"
    );

    let mut out = ResultSeries::with_capacity(sorted.len());
    for o in sorted {
        let key = cfg
            .offset
            .shift(o.timestamp)
            .ok_or(WindowError::ShiftOutOfRange(o.timestamp))?;
        let (sum, count) = rolled[nearest_position(&index, key)?];
        out.push(o.timestamp, cfg.aggregation.finish(sum, count));
    }
    Ok(out)
}

// ================================================================================================
// Two-Pointer Strategy
// ================================================================================================

/// Direct forward scan over sorted observations.
///
/// Unlike the augmented formulation, observations sharing a timestamp are all
/// summed; nothing collapses.
fn two_pointer_forward(sorted: &[Observation], cfg: &RollingConfig) -> ResultSeries {
    let width = cfg.offset.duration();
    let mut out = ResultSeries::with_capacity(sorted.len());
    let (mut lo, mut hi) = (0usize, 0usize);
    let mut sum = 0.0;
    let mut count = 0usize;

    for o in sorted {
        let t = o.timestamp;
        // Shift overflow only happens at the very end of chrono's range, where
        // every later observation is inside the window anyway.
        let horizon = t.checked_add_signed(width);
        let in_head = |u: TimePoint| match (cfg.closed, horizon) {
            (_, None) => true,
            (ClosedWindow::Left, Some(h)) => u < h,
            (ClosedWindow::Right, Some(h)) => u <= h,
        };
        let before_tail = |u: TimePoint| match cfg.closed {
            ClosedWindow::Left => u < t,
            ClosedWindow::Right => u <= t,
        };

        while hi < sorted.len() && in_head(sorted[hi].timestamp) {
            sum += sorted[hi].value;
            count += 1;
            hi += 1;
        }
        while lo < hi && before_tail(sorted[lo].timestamp) {
            sum -= sorted[lo].value;
            count -= 1;
            lo += 1;
        }
        if count == 0 {
            sum = 0.0;
        }
        out.push(t, cfg.aggregation.finish(sum, count));
    }

    out
}
