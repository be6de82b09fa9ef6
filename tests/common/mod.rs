#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveTime};
use tsreshape::prelude::*;

/// Ragged millisecond ticks, newest first, as recorded upstream.
pub const TICKS: &str = "dtime                    value
2018-04-23 06:45:16.920  -0.11
2018-04-23 06:45:16.919  -0.03
2018-04-23 06:45:16.918  -0.01
2018-04-23 06:45:16.917  -0.02
2018-04-23 06:45:16.916   0.03
2018-04-23 06:45:16.914   0.03
2018-04-23 06:45:16.911   0.03
2018-04-23 06:45:16.910   0.06
2018-04-23 06:45:16.909   0.09
2018-04-23 06:45:16.908   0.08
2018-04-23 06:45:16.907   0.18
2018-04-23 06:45:16.906   0.28
2018-04-23 06:45:16.905   0.28
2018-04-23 06:45:16.904   0.02
2018-04-23 06:45:16.903   0.09
2018-04-23 06:45:16.902   0.09
2018-04-23 06:45:16.901   0.09
2018-04-23 06:45:16.900   0.09
2018-04-23 06:45:16.899  -0.24
2018-04-23 06:45:16.898  -0.22
2018-04-23 06:45:16.894  -0.22
2018-04-23 06:45:16.799  -0.21
2018-04-23 06:45:16.798  -0.19
2018-04-23 06:45:16.797  -0.21
2018-04-23 06:45:15.057  -0.13
2018-04-23 06:45:15.056  -0.16
2018-04-23 06:45:13.382  -0.04
2018-04-23 06:45:13.381  -0.02
2018-04-23 06:45:13.380  -0.05
2018-04-23 06:45:13.379  -0.08
";

/// Forward sums over `[t, t + 10ms)` for [`TICKS`], oldest first.
pub const TICKS_FORWARD_10MS: [(&str, f64); 30] = [
    ("2018-04-23 06:45:13.379", -0.19),
    ("2018-04-23 06:45:13.380", -0.11),
    ("2018-04-23 06:45:13.381", -0.06),
    ("2018-04-23 06:45:13.382", -0.04),
    ("2018-04-23 06:45:15.056", -0.29),
    ("2018-04-23 06:45:15.057", -0.13),
    ("2018-04-23 06:45:16.797", -0.61),
    ("2018-04-23 06:45:16.798", -0.40),
    ("2018-04-23 06:45:16.799", -0.21),
    ("2018-04-23 06:45:16.894", -0.32),
    ("2018-04-23 06:45:16.898", 0.66),
    ("2018-04-23 06:45:16.899", 0.96),
    ("2018-04-23 06:45:16.900", 1.29),
    ("2018-04-23 06:45:16.901", 1.26),
    ("2018-04-23 06:45:16.902", 1.20),
    ("2018-04-23 06:45:16.903", 1.11),
    ("2018-04-23 06:45:16.904", 1.02),
    ("2018-04-23 06:45:16.905", 1.03),
    ("2018-04-23 06:45:16.906", 0.75),
    ("2018-04-23 06:45:16.907", 0.50),
    ("2018-04-23 06:45:16.908", 0.30),
    ("2018-04-23 06:45:16.909", 0.21),
    ("2018-04-23 06:45:16.910", 0.09),
    ("2018-04-23 06:45:16.911", -0.08),
    ("2018-04-23 06:45:16.914", -0.11),
    ("2018-04-23 06:45:16.916", -0.14),
    ("2018-04-23 06:45:16.917", -0.17),
    ("2018-04-23 06:45:16.918", -0.15),
    ("2018-04-23 06:45:16.919", -0.14),
    ("2018-04-23 06:45:16.920", -0.11),
];

pub const SPANS: &str = "ID   EventID  Start                    End
G01  1001     2017-10-16 06:03:37.440  2017-10-16 06:24:24.440
G07  1001     2017-10-16 06:11:04.600  2017-10-16 07:28:43.520
G02  1001     2017-10-16 06:15:36.200  2017-10-16 06:23:36.200
G02  1001     2017-10-16 06:18:36.200  2017-10-16 07:03:36.200
G06  1001     2017-10-16 06:18:21.160  2017-10-16 06:23:36.120
G03  1001     2017-10-16 06:29:20.640  2017-10-16 06:47:20.640
G05  1001     2017-10-16 06:29:41.640  2017-10-16 06:36:26.640
";

pub const EPS: f64 = 1e-9;

pub fn ticks() -> Series {
    Table::parse(TICKS)
        .map_err(ReshapeError::from)
        .and_then(|t| t.series("dtime", "value"))
        .expect("tick fixture parses")
}

pub fn spans() -> Vec<Span> {
    Table::parse(SPANS)
        .map_err(ReshapeError::from)
        .and_then(|t| t.spans("ID", "EventID", "Start", "End"))
        .expect("span fixture parses")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One observation per calendar day, valued 0, 1, 2, ... from `start`.
pub fn daily_counter(start: NaiveDate, end: NaiveDate) -> Series {
    let days = (end - start).num_days();
    Series::from_pairs(
        (0..=days).map(|i| (start.and_time(NaiveTime::MIN) + Duration::days(i), i as f64)),
    )
}

/// Forward sum by exhaustive scan, for cross-checking.
pub fn brute_force_forward_sum(
    series: &Series,
    offset: WindowOffset,
    closed: ClosedWindow,
) -> Vec<(TimePoint, Option<f64>)> {
    let sorted = series.sorted();
    let w = offset.duration();
    let contains = |t: TimePoint, u: TimePoint| match closed {
        ClosedWindow::Left => t <= u && u < t + w,
        ClosedWindow::Right => t < u && u <= t + w,
    };
    sorted
        .iter()
        .map(|o| {
            let inside: Vec<f64> = sorted
                .iter()
                .filter(|u| contains(o.timestamp, u.timestamp))
                .map(|u| u.value)
                .collect();
            let sum = (!inside.is_empty()).then(|| inside.iter().sum::<f64>());
            (o.timestamp, sum)
        })
        .collect()
}

pub fn assert_close(got: Option<f64>, want: Option<f64>, ctx: &str) {
    match (got, want) {
        (Some(g), Some(w)) => assert!((g - w).abs() < EPS, "{ctx}: got {g}, want {w}"),
        (None, None) => {}
        _ => panic!("{ctx}: got {got:?}, want {want:?}"),
    }
}
