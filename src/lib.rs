//! # tsreshape
//!
//! Reshaping transforms for irregular time series:
//!
//! - forward-looking rolling aggregates over a ragged timestamp index
//!   ([`rolling`]),
//! - business-day aligned interval buckets and bucket means ([`calendar`],
//!   [`bucket`]),
//! - explosion of time spans into fixed-width sub-interval records
//!   ([`explode`]).
//!
//! All transforms are synchronous, in-memory and side-effect free. Results can
//! be exported as polars frames through [`frame`].

pub mod bucket;
pub mod calendar;
pub mod error;
pub mod explode;
pub mod frame;
pub mod parse;
pub mod prelude;
pub mod rolling;
pub mod series;
pub mod window;

pub use error::{ReshapeError, ReshapeResult};
pub use rolling::{compute_forward_rolling_sum, forward_rolling};
