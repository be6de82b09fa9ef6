use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{Datelike, NaiveDate, Weekday};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CalendarError, ReshapeResult},
    series::TimePoint,
};

// ================================================================================================
// Weekmask
// ================================================================================================

/// The set of weekdays counted as business days.
///
/// Parses from whitespace-separated day names, e.g. `"Mon Tue Wed Thu Fri"`
/// or `"Sun Mon Tue Wed Thu"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Weekmask(u8);

impl Weekmask {
    pub const MON_FRI: Weekmask = Weekmask(0b0001_1111);

    pub fn from_days<I: IntoIterator<Item = Weekday>>(days: I) -> Result<Self, CalendarError> {
        let bits = days
            .into_iter()
            .fold(0u8, |acc, d| acc | (1 << d.num_days_from_monday()));
        if bits == 0 {
            return Err(CalendarError::EmptyWeekmask);
        }
        Ok(Self(bits))
    }

    #[inline]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|d| self.contains(*d))
    }
}

impl Default for Weekmask {
    fn default() -> Self {
        Self::MON_FRI
    }
}

impl FromStr for Weekmask {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .split_whitespace()
            .map(|tok| {
                tok.parse::<Weekday>()
                    .map_err(|_| CalendarError::InvalidWeekday(tok.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_days(days)
    }
}

impl fmt::Display for Weekmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days().join(" "))
    }
}

impl TryFrom<String> for Weekmask {
    type Error = CalendarError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Weekmask> for String {
    fn from(mask: Weekmask) -> Self {
        mask.to_string()
    }
}

// ================================================================================================
// Business Calendar
// ================================================================================================

/// Business-day calendar: a weekmask plus explicit holidays.
///
/// Offsets follow the usual business-day convention: shifting by `n > 0`
/// moves to the `n`-th business day strictly after the date, `n < 0` to the
/// `|n|`-th strictly before, and `n = 0` rolls a non-business date forward.
///
/// # Example
/// ```
/// # use tsreshape::prelude::*;
/// # use chrono::NaiveDate;
/// let cal = BusinessCalendar::default()
///     .with_holidays([NaiveDate::from_ymd_opt(2018, 5, 28).unwrap()]);
/// let thursday = NaiveDate::from_ymd_opt(2018, 5, 24).unwrap();
/// let shifted = cal.add_business_days(thursday, 3).unwrap();
/// assert_eq!(shifted, NaiveDate::from_ymd_opt(2018, 5, 30).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    #[serde(default)]
    pub weekmask: Weekmask,

    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
    pub fn new(weekmask: Weekmask) -> Self {
        Self {
            weekmask,
            holidays: BTreeSet::new(),
        }
    }

    pub fn from_json(json: &str) -> ReshapeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(mut self, holidays: I) -> Self {
        self.holidays.extend(holidays);
        self
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.weekmask.contains(date.weekday()) && !self.holidays.contains(&date)
    }

    /// First business day strictly after `date`.
    pub fn next_business_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut d = date;
        loop {
            d = d.succ_opt().ok_or(CalendarError::OutOfRange(date))?;
            if self.is_business_day(d) {
                return Ok(d);
            }
        }
    }

    /// Last business day strictly before `date`.
    pub fn prev_business_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut d = date;
        loop {
            d = d.pred_opt().ok_or(CalendarError::OutOfRange(date))?;
            if self.is_business_day(d) {
                return Ok(d);
            }
        }
    }

    /// `date` itself if it is a business day, else the next one.
    pub fn roll_forward(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        if self.is_business_day(date) {
            Ok(date)
        } else {
            self.next_business_day(date)
        }
    }

    /// `date` itself if it is a business day, else the previous one.
    pub fn roll_backward(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        if self.is_business_day(date) {
            Ok(date)
        } else {
            self.prev_business_day(date)
        }
    }

    pub fn add_business_days(&self, date: NaiveDate, n: i32) -> Result<NaiveDate, CalendarError> {
        if n == 0 {
            return self.roll_forward(date);
        }
        let mut d = date;
        for _ in 0..n.unsigned_abs() {
            d = if n > 0 {
                self.next_business_day(d)?
            } else {
                self.prev_business_day(d)?
            };
        }
        Ok(d)
    }

    /// Like [`Self::add_business_days`] but keeps the time of day.
    pub fn shift(&self, ts: TimePoint, n: i32) -> Result<TimePoint, CalendarError> {
        Ok(self.add_business_days(ts.date(), n)?.and_time(ts.time()))
    }

    /// All business days in `[start, end]`.
    pub fn business_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, CalendarError> {
        let mut out = Vec::new();
        if start > end {
            return Ok(out);
        }
        let mut d = self.roll_forward(start)?;
        while d <= end {
            out.push(d);
            d = match self.next_business_day(d) {
                Ok(next) => next,
                Err(_) => break,
            };
        }
        Ok(out)
    }

    /// First business day of every month, restricted to `[start, end]`.
    pub fn business_month_starts(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, CalendarError> {
        let mut out = Vec::new();
        let Some(mut first) = NaiveDate::from_ymd_opt(start.year(), start.month(), 1) else {
            return Err(CalendarError::OutOfRange(start));
        };
        while first <= end {
            let bms = self.roll_forward(first)?;
            if bms >= start && bms <= end {
                out.push(bms);
            }
            first = first
                .checked_add_months(chrono::Months::new(1))
                .ok_or(CalendarError::OutOfRange(first))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekmask_parses_and_displays() {
        let egypt: Weekmask = "Sun Mon Tue Wed Thu".parse().unwrap();
        assert!(egypt.contains(Weekday::Sun));
        assert!(!egypt.contains(Weekday::Fri));
        assert_eq!(egypt.to_string(), "Mon Tue Wed Thu Sun");
        assert_eq!(Weekmask::default().to_string(), "Mon Tue Wed Thu Fri");
    }

    #[test]
    fn weekmask_rejects_empty_and_unknown_days() {
        assert_eq!("".parse::<Weekmask>(), Err(CalendarError::EmptyWeekmask));
        assert_eq!(
            "Mon Funday".parse::<Weekmask>(),
            Err(CalendarError::InvalidWeekday("Funday".to_string()))
        );
    }

    #[test]
    fn offsets_skip_weekends_and_holidays() {
        let cal = BusinessCalendar::default().with_holidays([d(2018, 5, 28)]);
        // Thursday + 3 business days over a weekend and Memorial Day.
        assert_eq!(cal.add_business_days(d(2018, 5, 24), 3).unwrap(), d(2018, 5, 30));
        // Saturday rolls to Monday for +1, back to Friday for -1.
        let plain = BusinessCalendar::default();
        assert_eq!(plain.add_business_days(d(2015, 4, 4), 1).unwrap(), d(2015, 4, 6));
        assert_eq!(plain.add_business_days(d(2015, 4, 4), -1).unwrap(), d(2015, 4, 3));
        assert_eq!(plain.add_business_days(d(2015, 4, 4), 0).unwrap(), d(2015, 4, 6));
        assert_eq!(plain.add_business_days(d(2015, 4, 6), 0).unwrap(), d(2015, 4, 6));
        assert_eq!(plain.add_business_days(d(2015, 4, 1), 3).unwrap(), d(2015, 4, 6));
    }

    #[test]
    fn month_starts_roll_to_first_business_day() {
        let cal = BusinessCalendar::default();
        let starts = cal.business_month_starts(d(2015, 4, 1), d(2015, 6, 30)).unwrap();
        assert_eq!(starts, vec![d(2015, 4, 1), d(2015, 5, 1), d(2015, 6, 1)]);

        // August 2015 starts on a Saturday.
        let starts = cal.business_month_starts(d(2015, 8, 1), d(2015, 8, 31)).unwrap();
        assert_eq!(starts, vec![d(2015, 8, 3)]);

        // A first business day before `start` is excluded.
        let starts = cal.business_month_starts(d(2015, 4, 2), d(2015, 5, 31)).unwrap();
        assert_eq!(starts, vec![d(2015, 5, 1)]);
    }

    #[test]
    fn business_days_between_q2_2015() {
        let cal = BusinessCalendar::default();
        let days = cal.business_days(d(2015, 4, 1), d(2015, 6, 30)).unwrap();
        assert_eq!(days.len(), 65);
        assert_eq!(days.first(), Some(&d(2015, 4, 1)));
        assert_eq!(days.last(), Some(&d(2015, 6, 30)));
    }

    #[test]
    fn calendar_from_json() {
        let cal = BusinessCalendar::from_json(
            r#"{ "weekmask": "Sun Mon Tue Wed Thu", "holidays": ["2018-01-01"] }"#,
        )
        .unwrap();
        assert!(!cal.is_business_day(d(2018, 1, 1)));
        assert!(cal.is_business_day(d(2018, 1, 7)));
        assert!(BusinessCalendar::from_json(r#"{ "weekmask": "" }"#).is_err());
    }
}
