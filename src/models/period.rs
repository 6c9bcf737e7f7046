//! Date windows used by statistics and spending limits
//!
//! Weeks start on Monday. All ranges are inclusive on both ends.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Reporting periods for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    Last7Days,
    Last30Days,
    /// No date restriction
    All,
}

impl StatsPeriod {
    /// Range of this period around `today`, `None` for [`StatsPeriod::All`]
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        let range = match self {
            StatsPeriod::Day => DateRange::new(today, today),
            StatsPeriod::Week => week_of(today),
            StatsPeriod::Month => month_of(today),
            StatsPeriod::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = ymd(today.year(), first_month, 1);
                let end = last_day_of_month(today.year(), first_month + 2);
                DateRange::new(start, end)
            }
            StatsPeriod::Year => year_of(today),
            StatsPeriod::Last7Days => DateRange::new(today - Duration::days(6), today),
            StatsPeriod::Last30Days => DateRange::new(today - Duration::days(29), today),
            StatsPeriod::All => return None,
        };
        Some(range)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatsPeriod::Day => "Today",
            StatsPeriod::Week => "This week",
            StatsPeriod::Month => "This month",
            StatsPeriod::Quarter => "This quarter",
            StatsPeriod::Year => "This year",
            StatsPeriod::Last7Days => "Last 7 days",
            StatsPeriod::Last30Days => "Last 30 days",
            StatsPeriod::All => "All time",
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "7d" | "last7days" => Ok(Self::Last7Days),
            "30d" | "last30days" => Ok(Self::Last30Days),
            "all" => Ok(Self::All),
            other => Err(format!("Unknown period '{}'", other)),
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Monday..Sunday week containing `date`
pub fn week_of(date: NaiveDate) -> DateRange {
    let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    DateRange::new(start, start + Duration::days(6))
}

pub fn month_of(date: NaiveDate) -> DateRange {
    DateRange::new(
        ymd(date.year(), date.month(), 1),
        last_day_of_month(date.year(), date.month()),
    )
}

pub fn year_of(date: NaiveDate) -> DateRange {
    DateRange::new(ymd(date.year(), 1, 1), ymd(date.year(), 12, 31))
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    ymd(next_year, next_month, 1) - Duration::days(1)
}
