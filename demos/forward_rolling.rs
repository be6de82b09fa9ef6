use std::{path::Path, time::Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsreshape::prelude::*;

const TICKS: &str = "dtime                    value
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

fn main() -> Result<()> {
    init_tracing();

    let series = Table::parse(TICKS)?
        .series("dtime", "value")
        .context("tick table has dtime and value columns")?;
    info!(rows = series.len(), "ticks loaded");

    let cfg = RollingConfig::from_json(r#"{ "offset": "10ms" }"#)?;
    let start = Instant::now();
    let sums = forward_rolling(&series, &cfg)?;
    let elapsed = start.elapsed();

    println!("{:<25} {:>8}", "dtime", "fwd_sum");
    for entry in sums.iter() {
        match entry.value {
            Some(v) => println!("{:<25} {v:>8.2}", entry.timestamp.to_string()),
            None => println!("{:<25} {:>8}", entry.timestamp.to_string(), "-"),
        }
    }

    let counts = forward_rolling(&series, &cfg.with_aggregation(Aggregation::Count))?;
    let busiest = counts
        .iter()
        .filter_map(|e| e.value.map(|v| (e.timestamp, v)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((ts, n)) = busiest {
        println!("\nBusiest window starts at {ts} with {n} ticks");
    }

    let path = Path::new("demos/output/forward_rolling.csv");
    sums.to_csv(path)?;
    println!("\nComputed in {elapsed:?}, written to {}", path.display());
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
