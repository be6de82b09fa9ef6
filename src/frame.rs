use std::{fs, path::Path};

use polars::prelude::{
    Column, CsvWriter, DataFrame, DataType, NamedFrom, PolarsResult, SerWriter, TimeUnit,
};

use crate::{
    bucket::BucketMean,
    error::ReshapeResult,
    explode::SubInterval,
    series::{ResultSeries, Series, TimePoint, to_epoch_millis},
};

// ================================================================================================
// Traits
// ================================================================================================

/// Materializes a result as a polars `DataFrame`.
///
/// Timestamps become `Datetime(ms)`, durations `Duration(ms)` and the
/// "no value" marker becomes null.
pub trait ToDataFrame {
    fn to_df(&self) -> ReshapeResult<DataFrame>;
}

pub trait ToCsv {
    /// Writes the frame as CSV with a header row.
    ///
    /// Duration columns are written human-readable (e.g. `"6m 22s 560ms"`).
    ///
    /// # Side Effects
    /// - Creates missing parent directories.
    /// - Overwrites the file if it exists.
    fn to_csv(&self, path: impl AsRef<Path>) -> ReshapeResult<()>;
}

impl<T: ToDataFrame + ?Sized> ToCsv for T {
    fn to_csv(&self, path: impl AsRef<Path>) -> ReshapeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut df = self.to_df()?;
        humanize_durations(&mut df)?;
        let mut file = fs::File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        tracing::debug!(path = %path.display(), rows = df.height(), "csv written");
        Ok(())
    }
}

// ================================================================================================
// Implementations
// ================================================================================================

impl ToDataFrame for Series {
    fn to_df(&self) -> ReshapeResult<DataFrame> {
        let values: Vec<f64> = self.values().collect();
        Ok(DataFrame::new(vec![
            datetime_column("timestamp", self.timestamps())?,
            Column::new("value".into(), values),
        ])?)
    }
}

impl ToDataFrame for ResultSeries {
    fn to_df(&self) -> ReshapeResult<DataFrame> {
        let values: Vec<Option<f64>> = self.values().collect();
        Ok(DataFrame::new(vec![
            datetime_column("timestamp", self.timestamps())?,
            Column::new("value".into(), values),
        ])?)
    }
}

impl ToDataFrame for [BucketMean] {
    fn to_df(&self) -> ReshapeResult<DataFrame> {
        let closed: Vec<String> = self.iter().map(|m| m.bucket.closed().to_string()).collect();
        let means: Vec<Option<f64>> = self.iter().map(|m| m.mean).collect();
        let counts: Vec<u64> = self.iter().map(|m| m.count as u64).collect();
        Ok(DataFrame::new(vec![
            datetime_column("bucket_start", self.iter().map(|m| m.bucket.start()))?,
            datetime_column("bucket_end", self.iter().map(|m| m.bucket.end()))?,
            Column::new("closed".into(), closed),
            Column::new("mean".into(), means),
            Column::new("count".into(), counts),
        ])?)
    }
}

impl ToDataFrame for [SubInterval] {
    fn to_df(&self) -> ReshapeResult<DataFrame> {
        let ids: Vec<&str> = self.iter().map(|r| r.id.as_str()).collect();
        let events: Vec<&str> = self.iter().map(|r| r.event_id.as_str()).collect();
        let durations: Vec<i64> = self.iter().map(|r| r.duration.num_milliseconds()).collect();
        Ok(DataFrame::new(vec![
            Column::new("id".into(), ids),
            Column::new("event_id".into(), events),
            datetime_column("bucket_end", self.iter().map(|r| r.bucket_end))?,
            Column::new("duration".into(), durations)
                .cast(&DataType::Duration(TimeUnit::Milliseconds))?,
        ])?)
    }
}

fn datetime_column(name: &str, ts: impl Iterator<Item = TimePoint>) -> PolarsResult<Column> {
    let ms: Vec<i64> = ts.map(to_epoch_millis).collect();
    Column::new(name.into(), ms).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

/// Rewrites every `Duration` column as humantime text, e.g. `6m 22s 560ms`.
fn humanize_durations(df: &mut DataFrame) -> PolarsResult<()> {
    let formatted = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::Duration(_)))
        .map(|c| {
            let nanos = c
                .cast(&DataType::Duration(TimeUnit::Nanoseconds))?
                .cast(&DataType::Int64)?;
            let text: Vec<Option<String>> = nanos
                .i64()?
                .into_iter()
                .map(|v| {
                    let v = u64::try_from(v?).ok()?;
                    Some(humantime::format_duration(std::time::Duration::from_nanos(v)).to_string())
                })
                .collect();
            Ok(Column::new(c.name().clone(), text))
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    for column in formatted {
        df.with_column(column)?;
    }
    Ok(())
}
