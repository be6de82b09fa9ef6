use std::{fmt, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{
    error::{ReshapeResult, WindowError},
    series::TimePoint,
};

// ================================================================================================
// Window Offset
// ================================================================================================

/// A strictly positive, fixed look-ahead horizon.
///
/// Parses from humantime strings (`"10ms"`, `"10min"`, `"1h 30m"`) and
/// deserializes from either such a string or an integer number of
/// milliseconds.
///
/// # Example
/// ```
/// # use tsreshape::prelude::*;
/// let offset: WindowOffset = "10ms".parse().unwrap();
/// assert_eq!(offset.as_millis(), 10);
/// assert!("0ms".parse::<WindowOffset>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "OffsetRepr", into = "String")]
pub struct WindowOffset(Duration);

impl WindowOffset {
    pub fn new(duration: Duration) -> Result<Self, WindowError> {
        if duration <= Duration::zero() {
            return Err(WindowError::InvalidOffset(format!("{duration}")));
        }
        Ok(Self(duration))
    }

    pub fn from_millis(ms: i64) -> Result<Self, WindowError> {
        Self::new(Duration::milliseconds(ms))
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.0
    }

    #[inline]
    pub fn as_millis(&self) -> i64 {
        self.0.num_milliseconds()
    }

    /// `ts + offset`, or `None` past chrono's representable range.
    #[inline]
    pub fn shift(&self, ts: TimePoint) -> Option<TimePoint> {
        ts.checked_add_signed(self.0)
    }
}

impl FromStr for WindowOffset {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.starts_with('-') {
            return Err(WindowError::InvalidOffset(input.to_string()));
        }
        let std_duration =
            humantime::parse_duration(input).map_err(|e| WindowError::OffsetParse {
                input: input.to_string(),
                msg: e.to_string(),
            })?;
        let duration = Duration::from_std(std_duration).map_err(|e| WindowError::OffsetParse {
            input: input.to_string(),
            msg: e.to_string(),
        })?;
        Self::new(duration).map_err(|_| WindowError::InvalidOffset(input.to_string()))
    }
}

impl fmt::Display for WindowOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Positive by construction, so the conversion cannot fail.
        match self.0.to_std() {
            Ok(d) => write!(f, "{}", humantime::format_duration(d)),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl From<WindowOffset> for String {
    fn from(offset: WindowOffset) -> Self {
        offset.to_string()
    }
}

impl TryFrom<Duration> for WindowOffset {
    type Error = WindowError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        Self::new(duration)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OffsetRepr {
    Millis(i64),
    Text(String),
}

impl TryFrom<OffsetRepr> for WindowOffset {
    type Error = WindowError;

    fn try_from(repr: OffsetRepr) -> Result<Self, Self::Error> {
        match repr {
            OffsetRepr::Millis(ms) => Self::from_millis(ms),
            OffsetRepr::Text(s) => s.parse(),
        }
    }
}

// ================================================================================================
// Window Semantics
// ================================================================================================

/// Which edge of the forward window `t .. t + offset` is closed.
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
pub enum ClosedWindow {
    /// `[t, t + offset)`: the observation at `t` counts, the one at
    /// `t + offset` does not. Backward view: `[p - offset, p)`.
    #[default]
    Left,

    /// `(t, t + offset]`: strictly after `t`, up to and including
    /// `t + offset`. Backward view: `(p - offset, p]`.
    Right,
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
pub enum Aggregation {
    #[default]
    Sum,
    Count,
    Mean,
}

impl Aggregation {
    /// Finalizes a window given its running sum and observation count.
    /// An empty window yields `None` for every aggregation.
    #[inline]
    pub fn finish(&self, sum: f64, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        match self {
            Aggregation::Sum => Some(sum),
            Aggregation::Count => Some(count as f64),
            Aggregation::Mean => Some(sum / count as f64),
        }
    }
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
pub enum RollingStrategy {
    /// Reindex onto the union of original and shifted timestamps, roll
    /// backward, then join back on `t + offset`.
    #[default]
    AugmentedIndex,

    /// Scan the sorted observations once with a forward `[lo, hi)` window.
    /// Never materializes the augmented index.
    TwoPointer,
}

// ================================================================================================
// Rolling Config
// ================================================================================================

/// Parameters of one forward rolling computation.
///
/// # Example
/// ```
/// # use tsreshape::prelude::*;
/// let cfg = RollingConfig::from_json(r#"{ "offset": "10ms", "closed": "right" }"#).unwrap();
/// assert_eq!(cfg.offset.as_millis(), 10);
/// assert_eq!(cfg.closed, ClosedWindow::Right);
/// assert_eq!(cfg.aggregation, Aggregation::Sum);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollingConfig {
    pub offset: WindowOffset,

    #[serde(default)]
    pub closed: ClosedWindow,

    #[serde(default)]
    pub aggregation: Aggregation,

    #[serde(default)]
    pub strategy: RollingStrategy,
}

impl RollingConfig {
    pub fn new(offset: WindowOffset) -> Self {
        Self {
            offset,
            closed: ClosedWindow::default(),
            aggregation: Aggregation::default(),
            strategy: RollingStrategy::default(),
        }
    }

    pub fn from_json(json: &str) -> ReshapeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_closed(self, closed: ClosedWindow) -> Self {
        Self { closed, ..self }
    }

    pub fn with_aggregation(self, aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            ..self
        }
    }

    pub fn with_strategy(self, strategy: RollingStrategy) -> Self {
        Self { strategy, ..self }
    }
}
