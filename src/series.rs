use chrono::{DateTime, NaiveDateTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A timestamp with millisecond resolution.
///
/// Naive on purpose: the sample data carries no zone and all arithmetic is
/// plain wall-clock arithmetic.
pub type TimePoint = NaiveDateTime;

/// Milliseconds since the Unix epoch for a [`TimePoint`].
#[inline]
pub fn to_epoch_millis(ts: TimePoint) -> i64 {
    ts.and_utc().timestamp_millis()
}

/// Inverse of [`to_epoch_millis`]. `None` if the value is out of chrono's range.
#[inline]
pub fn from_epoch_millis(ms: i64) -> Option<TimePoint> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

// ================================================================================================
// Observation & Series
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: TimePoint,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: TimePoint, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(TimePoint, f64)> for Observation {
    fn from((timestamp, value): (TimePoint, f64)) -> Self {
        Self { timestamp, value }
    }
}

/// An irregularly sampled value series.
///
/// The series keeps observations in insertion order. Algorithms that need
/// time order call [`Series::sorted`] or [`Series::sort`], which are stable
/// so observations sharing a timestamp keep their relative order.
///
/// Timestamps are not required to be unique. See
/// [`Series::dedup_by_timestamp_value`] for the one remedy offered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (TimePoint, f64)>,
    {
        pairs.into_iter().map(Observation::from).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn push(&mut self, obs: Observation) {
        self.observations.push(obs);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn timestamps(&self) -> impl Iterator<Item = TimePoint> + '_ {
        self.observations.iter().map(|o| o.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    /// Returns `true` if timestamps are non-decreasing.
    pub fn is_sorted(&self) -> bool {
        self.observations
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.timestamp <= b.timestamp)
    }

    /// Stable in-place sort by timestamp. Idempotent.
    pub fn sort(&mut self) {
        if !self.is_sorted() {
            self.observations.sort_by_key(|o| o.timestamp);
        }
    }

    /// Stable sorted copy.
    pub fn sorted(&self) -> Series {
        let mut out = self.clone();
        out.sort();
        out
    }

    /// Returns `true` if at least two observations share a timestamp.
    pub fn has_duplicate_timestamps(&self) -> bool {
        self.sorted()
            .observations
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.timestamp == b.timestamp)
    }

    /// Drops exact `(timestamp, value)` repeats, keeping the first occurrence.
    ///
    /// This only protects against literal re-delivery of a row. Two logically
    /// distinct observations that collide on both timestamp and value are
    /// indistinguishable here and one of them is lost.
    pub fn dedup_by_timestamp_value(&self) -> Series {
        self.observations
            .iter()
            .copied()
            .unique_by(|o| (o.timestamp, o.value.to_bits()))
            .collect()
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Series {
    type Item = Observation;
    type IntoIter = std::vec::IntoIter<Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

// ================================================================================================
// Result Series
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub timestamp: TimePoint,

    /// `None` marks "no value": the window held no observation.
    /// `Some(0.0)` is a real, numerically zero aggregate.
    pub value: Option<f64>,
}

/// Output of a rolling computation: one entry per input observation, in
/// ascending timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSeries {
    entries: Vec<ResultEntry>,
}

impl ResultSeries {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, timestamp: TimePoint, value: Option<f64>) {
        self.entries.push(ResultEntry { timestamp, value });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[ResultEntry] {
        &self.entries
    }

    /// Value of the first entry at `ts`.
    ///
    /// The outer `Option` is `None` when no entry has that key. The inner one
    /// is the "no value" marker.
    pub fn get(&self, ts: TimePoint) -> Option<Option<f64>> {
        let idx = self.entries.partition_point(|e| e.timestamp < ts);
        self.entries
            .get(idx)
            .filter(|e| e.timestamp == ts)
            .map(|e| e.value)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = TimePoint> + '_ {
        self.entries.iter().map(|e| e.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.entries.iter().map(|e| e.value)
    }
}

impl<'a> IntoIterator for &'a ResultSeries {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
