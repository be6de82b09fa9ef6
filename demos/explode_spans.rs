use std::{env, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsreshape::prelude::*;

const SPANS: &str = "ID   EventID  Start                    End
G01  1001     2017-10-16 06:03:37.440  2017-10-16 06:24:24.440
G07  1001     2017-10-16 06:11:04.600  2017-10-16 07:28:43.520
G02  1001     2017-10-16 06:15:36.200  2017-10-16 06:23:36.200
G02  1001     2017-10-16 06:18:36.200  2017-10-16 07:03:36.200
G06  1001     2017-10-16 06:18:21.160  2017-10-16 06:23:36.120
G03  1001     2017-10-16 06:29:20.640  2017-10-16 06:47:20.640
G05  1001     2017-10-16 06:29:41.640  2017-10-16 06:36:26.640
";

fn main() -> Result<()> {
    init_tracing();

    // Bucket width and strategy may be overridden, e.g. `-- 5min per_row_map`.
    let mut args = env::args().skip(1);
    let width: WindowOffset = args
        .next()
        .as_deref()
        .unwrap_or("10min")
        .parse()
        .context("bucket width")?;
    let strategy: ExpansionStrategy = args
        .next()
        .as_deref()
        .unwrap_or("flat_records")
        .parse()
        .context("expansion strategy")?;

    let spans = Table::parse(SPANS)?.spans("ID", "EventID", "Start", "End")?;
    info!(spans = spans.len(), %width, %strategy, "exploding");

    let records = explode_spans(&spans, width, strategy)?;

    println!("{:<4} {:<8} {:<24} {:>10}", "ID", "EventID", "bucket_end", "seconds");
    for r in &records {
        println!(
            "{:<4} {:<8} {:<24} {:>10.2}",
            r.id,
            r.event_id,
            r.bucket_end.to_string(),
            r.duration.num_milliseconds() as f64 / 1000.0
        );
    }

    println!("\nSeconds per bucket");
    for (label, group) in &records
        .iter()
        .sorted_by_key(|r| r.bucket_end)
        .chunk_by(|r| r.bucket_end)
    {
        let ms: i64 = group.map(|r| r.duration.num_milliseconds()).sum();
        println!("  {label}  {:>10.2}", ms as f64 / 1000.0);
    }

    let path = Path::new("demos/output/exploded_spans.csv");
    records.to_csv(path)?;
    println!("\nWritten to {}", path.display());
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
