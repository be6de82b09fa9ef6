use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::{
    error::{DataError, ReshapeResult},
    explode::Span,
    series::{Observation, Series, TimePoint},
};

/// Columns are separated by two or more whitespace characters so that a
/// single space may appear inside a cell (`2018-04-23 06:45:16.920`).
static COLUMN_SEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("column separator regex is valid"));

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A whitespace-aligned text table, header first.
///
/// # Example
/// ```
/// # use tsreshape::prelude::*;
/// let table = Table::parse(
///     "dtime                    value
///      2018-04-23 06:45:16.920  -0.11
///      2018-04-23 06:45:16.919  -0.03",
/// )
/// .unwrap();
/// let series = table.series("dtime", "value").unwrap();
/// assert_eq!(series.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(text: &str) -> Result<Self, DataError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header_line) = lines.next().ok_or(DataError::MissingHeader)?;
        let header = split_cells(header_line);

        let rows = lines
            .map(|(line, text)| {
                let cells = split_cells(text);
                if cells.len() != header.len() {
                    return Err(DataError::RaggedRow {
                        line,
                        expected: header.len(),
                        got: cells.len(),
                    });
                }
                Ok(cells)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Result<usize, DataError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Builds a series from a timestamp column and a float column, in row order.
    pub fn series(&self, ts_col: &str, value_col: &str) -> ReshapeResult<Series> {
        let (ts_idx, value_idx) = (self.column(ts_col)?, self.column(value_col)?);
        self.rows
            .iter()
            .map(|row| -> ReshapeResult<Observation> {
                let timestamp = parse_timestamp(&row[ts_idx])?;
                let value = row[value_idx].parse::<f64>()?;
                Ok(Observation::new(timestamp, value))
            })
            .collect()
    }

    /// Builds span records from id, event, start and end columns.
    pub fn spans(
        &self,
        id_col: &str,
        event_col: &str,
        start_col: &str,
        end_col: &str,
    ) -> ReshapeResult<Vec<Span>> {
        let id = self.column(id_col)?;
        let event = self.column(event_col)?;
        let start = self.column(start_col)?;
        let end = self.column(end_col)?;
        self.rows
            .iter()
            .map(|row| -> ReshapeResult<Span> {
                Ok(Span::new(
                    row[id].as_str(),
                    row[event].as_str(),
                    parse_timestamp(&row[start])?,
                    parse_timestamp(&row[end])?,
                )?)
            })
            .collect()
    }
}

fn split_cells(line: &str) -> Vec<String> {
    COLUMN_SEP.split(line).map(str::to_string).collect()
}

/// Parses `YYYY-MM-DD HH:MM:SS[.fff]`, its `T`-separated form, or a bare date.
pub fn parse_timestamp(s: &str) -> Result<TimePoint, DataError> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| DataError::TimestampParse(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReshapeError;

    #[test]
    fn cells_may_contain_single_spaces() {
        let table = Table::parse(
            "ID   EventID  Start                    End
             G01  1001     2017-10-16 06:03:37.440  2017-10-16 06:24:24.440",
        )
        .unwrap();
        assert_eq!(table.header(), ["ID", "EventID", "Start", "End"]);
        let spans = table.spans("ID", "EventID", "Start", "End").unwrap();
        assert_eq!(spans[0].id, "G01");
        assert_eq!(spans[0].length(), chrono::Duration::milliseconds(1_247_000));
    }

    #[test]
    fn timestamps_accept_fractional_seconds_and_bare_dates() {
        let a = parse_timestamp("2018-04-23 06:45:16.920").unwrap();
        let b = parse_timestamp("2018-04-23T06:45:16.920").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.and_utc().timestamp_subsec_millis(), 920);
        assert_eq!(
            parse_timestamp("2015-04-01").unwrap(),
            NaiveDate::from_ymd_opt(2015, 4, 1).unwrap().and_time(NaiveTime::MIN)
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DataError::TimestampParse(_))
        ));
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert!(matches!(Table::parse("   \n  "), Err(DataError::MissingHeader)));
        assert!(matches!(
            Table::parse("a  b\n1  2  3"),
            Err(DataError::RaggedRow { line: 2, expected: 2, got: 3 })
        ));

        let table = Table::parse("dtime  value\n2018-04-23  abc").unwrap();
        assert!(matches!(
            table.series("dtime", "price"),
            Err(ReshapeError::Data(DataError::MissingColumn(_)))
        ));
        assert!(matches!(
            table.series("dtime", "value"),
            Err(ReshapeError::Data(DataError::ParseFloat(_)))
        ));
    }
}
