use std::path::Path;

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsreshape::prelude::*;

fn main() -> Result<()> {
    init_tracing();

    let start = date(2015, 4, 1)?;
    let end = date(2015, 6, 30)?;
    let daily: Series = (0..=(end - start).num_days())
        .map(|i| Observation::new(start.and_time(NaiveTime::MIN) + Duration::days(i), i as f64))
        .collect();

    let cal = BusinessCalendar::default();
    let business = resample_business_last(&daily, &cal)?;
    info!(daily = daily.len(), business = business.len(), "resampled");

    // Days 1 through 3 after each month start.
    let month_buckets = cal
        .business_month_starts(start, end)?
        .into_iter()
        .map(|d| IntervalBucket::from_business_offsets(&cal, d, 1, 3, BucketClosed::Both))
        .collect::<Result<Vec<_>, _>>()?;
    let month_means = bucket_means(&business, &month_buckets);
    print_means("Month-start buckets", &month_means);

    // Two days before through four days after each marker.
    let days = cal.business_days(start, end)?;
    let around_markers = [12, 33, 57]
        .into_iter()
        .filter_map(|i| days.get(i).copied())
        .map(|d| IntervalBucket::around(&cal, d, 2, 4, BucketClosed::Both))
        .collect::<Result<Vec<_>, _>>()?;
    let marker_means = bucket_means(&business, &around_markers);
    print_means("Marker buckets", &marker_means);

    let path = Path::new("demos/output/marker_bucket_means.csv");
    marker_means.to_csv(path)?;
    println!("\nWritten to {}", path.display());
    Ok(())
}

fn print_means(title: &str, means: &[BucketMean]) {
    println!("\n{title}");
    for m in means {
        let mean = m.mean.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
        println!("  {:<28} mean={mean:<12} n={}", m.bucket.to_string(), m.count);
    }
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow::anyhow!("invalid date {y}-{m}-{d}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
