//! Calendar-aware bucket boundaries for date histograms. All UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarInterval {
    Second,
    Minute,
    Hour,
    Day,
    /// ISO weeks, starting on Monday.
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarInterval {
    /// Start of the bucket containing `t`.
    pub fn floor(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let date = t.date_naive();
        match self {
            CalendarInterval::Second => t.with_nanosecond(0).unwrap_or(t),
            CalendarInterval::Minute => midnight(date) + time_of_day(t.hour(), t.minute(), 0),
            CalendarInterval::Hour => midnight(date) + time_of_day(t.hour(), 0, 0),
            CalendarInterval::Day => midnight(date),
            CalendarInterval::Week => {
                let back = date.weekday().num_days_from_monday() as i64;
                midnight(date) - Duration::days(back)
            }
            CalendarInterval::Month => first_of_month(date.year(), date.month()),
            CalendarInterval::Quarter => first_of_month(date.year(), (date.month0() / 3) * 3 + 1),
            CalendarInterval::Year => first_of_month(date.year(), 1),
        }
    }

    /// Start of the bucket after the one starting at `start`.
    pub fn next(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            CalendarInterval::Second => start.checked_add_signed(Duration::seconds(1)),
            CalendarInterval::Minute => start.checked_add_signed(Duration::minutes(1)),
            CalendarInterval::Hour => start.checked_add_signed(Duration::hours(1)),
            CalendarInterval::Day => start.checked_add_signed(Duration::days(1)),
            CalendarInterval::Week => start.checked_add_signed(Duration::weeks(1)),
            CalendarInterval::Month => start.checked_add_months(Months::new(1)),
            CalendarInterval::Quarter => start.checked_add_months(Months::new(3)),
            CalendarInterval::Year => start.checked_add_months(Months::new(12)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CalendarInterval::Second => "second",
            CalendarInterval::Minute => "minute",
            CalendarInterval::Hour => "hour",
            CalendarInterval::Day => "day",
            CalendarInterval::Week => "week",
            CalendarInterval::Month => "month",
            CalendarInterval::Quarter => "quarter",
            CalendarInterval::Year => "year",
        }
    }
}

impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalendarInterval {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "1s" => Ok(CalendarInterval::Second),
            "minute" | "1m" => Ok(CalendarInterval::Minute),
            "hour" | "1h" => Ok(CalendarInterval::Hour),
            "day" | "1d" => Ok(CalendarInterval::Day),
            "week" | "1w" => Ok(CalendarInterval::Week),
            "month" | "1mo" => Ok(CalendarInterval::Month),
            "quarter" | "1q" => Ok(CalendarInterval::Quarter),
            "year" | "1y" => Ok(CalendarInterval::Year),
            other => Err(QuarryError::invalid_argument(format!(
                "unknown calendar interval '{other}'"
            ))),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn time_of_day(hour: u32, minute: u32, second: u32) -> Duration {
    Duration::seconds((hour * 3600 + minute * 60 + second) as i64)
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // Month is always 1..=12 here.
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(midnight)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_floor() {
        let t = at("2024-05-15T13:47:12.345Z");
        assert_eq!(CalendarInterval::Second.floor(t), at("2024-05-15T13:47:12Z"));
        assert_eq!(CalendarInterval::Minute.floor(t), at("2024-05-15T13:47:00Z"));
        assert_eq!(CalendarInterval::Hour.floor(t), at("2024-05-15T13:00:00Z"));
        assert_eq!(CalendarInterval::Day.floor(t), at("2024-05-15T00:00:00Z"));
        // 2024-05-15 is a Wednesday.
        assert_eq!(CalendarInterval::Week.floor(t), at("2024-05-13T00:00:00Z"));
        assert_eq!(CalendarInterval::Month.floor(t), at("2024-05-01T00:00:00Z"));
        assert_eq!(CalendarInterval::Quarter.floor(t), at("2024-04-01T00:00:00Z"));
        assert_eq!(CalendarInterval::Year.floor(t), at("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_next_is_calendar_aware() {
        let jan = at("2024-01-01T00:00:00Z");
        let feb = CalendarInterval::Month.next(jan).unwrap();
        assert_eq!(feb, at("2024-02-01T00:00:00Z"));
        assert_eq!(
            CalendarInterval::Month.next(feb).unwrap(),
            at("2024-03-01T00:00:00Z")
        );
        assert_eq!(
            CalendarInterval::Quarter.next(at("2024-10-01T00:00:00Z")).unwrap(),
            at("2025-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("Week".parse::<CalendarInterval>().unwrap(), CalendarInterval::Week);
        assert!("fortnight".parse::<CalendarInterval>().is_err());
    }
}
