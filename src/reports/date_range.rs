//! Turns a duration specifier (`daily`, `weekly`, ..., `period`) into a
//! concrete inclusive UTC window plus a display title.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::dtos::report::ReportQuery;
use crate::reports::ReportError;

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationMode {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
    Period,
}

impl DurationMode {
    /// A missing mode means `daily`.
    pub fn parse(raw: Option<&str>) -> Result<Self, ReportError> {
        let Some(raw) = non_blank(raw) else {
            return Ok(DurationMode::Daily);
        };
        match raw.to_ascii_lowercase().as_str() {
            "daily" => Ok(DurationMode::Daily),
            "weekly" => Ok(DurationMode::Weekly),
            "monthly" => Ok(DurationMode::Monthly),
            "yearly" => Ok(DurationMode::Yearly),
            "custom" => Ok(DurationMode::Custom),
            "period" => Ok(DurationMode::Period),
            _ => Err(ReportError::InvalidDuration(raw.to_string())),
        }
    }
}

/// The duration-related slice of a report query.
#[derive(Debug, Default, Clone, Copy)]
pub struct DurationInput<'a> {
    pub duration: Option<&'a str>,
    pub date: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub period: Option<&'a str>,
}

impl<'a> From<&'a ReportQuery> for DurationInput<'a> {
    fn from(query: &'a ReportQuery) -> Self {
        DurationInput {
            duration: query.duration.as_deref(),
            date: query.date.as_deref(),
            start_date: query.start_date.as_deref(),
            end_date: query.end_date.as_deref(),
            period: query.period.as_deref(),
        }
    }
}

/// Inclusive window `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(skip)]
    pub title: String,
}

impl DateRange {
    fn days(first: NaiveDate, last: NaiveDate, title: String) -> Self {
        DateRange {
            start: start_of_day(first),
            end: end_of_day(last),
            title,
        }
    }
}

pub fn resolve(input: &DurationInput<'_>, now: DateTime<Utc>) -> Result<DateRange, ReportError> {
    let today = now.date_naive();

    match DurationMode::parse(input.duration)? {
        DurationMode::Daily => {
            let raw = non_blank(input.date).ok_or(ReportError::MissingDate)?;
            let day = parse_day(raw)?;
            Ok(DateRange::days(day, day, format!("Daily Report - {}", day)))
        }
        DurationMode::Weekly => {
            let anchor = optional_day(input.date, today)?;
            let first = anchor
                .checked_sub_days(Days::new(u64::from(anchor.weekday().num_days_from_sunday())))
                .ok_or_else(|| ReportError::InvalidDate(anchor.to_string()))?;
            let last = first
                .checked_add_days(Days::new(6))
                .ok_or_else(|| ReportError::InvalidDate(anchor.to_string()))?;
            Ok(DateRange::days(first, last, format!("Weekly Report - {} to {}", first, last)))
        }
        DurationMode::Monthly => {
            let anchor = optional_day(input.date, today)?;
            let (first, last) = month_bounds(anchor)
                .ok_or_else(|| ReportError::InvalidDate(anchor.to_string()))?;
            Ok(DateRange::days(first, last, format!("Monthly Report - {}", first.format("%B %Y"))))
        }
        DurationMode::Yearly => {
            let anchor = optional_day(input.date, today)?;
            let year = anchor.year();
            let (first, last) = NaiveDate::from_ymd_opt(year, 1, 1)
                .zip(NaiveDate::from_ymd_opt(year, 12, 31))
                .ok_or_else(|| ReportError::InvalidDate(anchor.to_string()))?;
            Ok(DateRange::days(first, last, format!("Yearly Report - {}", year)))
        }
        DurationMode::Custom => {
            let (Some(raw_start), Some(raw_end)) = (non_blank(input.start_date), non_blank(input.end_date)) else {
                return Err(ReportError::MissingDateRange);
            };
            let first = parse_day(raw_start)?;
            let last = parse_day(raw_end)?;
            if first > last {
                return Err(ReportError::InvalidDateRange);
            }
            Ok(DateRange::days(first, last, format!("Custom Report - {} to {}", first, last)))
        }
        DurationMode::Period => {
            let days = non_blank(input.period)
                .and_then(|raw| raw.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .ok_or(ReportError::InvalidPeriod)?;
            let first = today
                .checked_sub_days(Days::new(u64::from(days - 1)))
                .ok_or(ReportError::InvalidPeriod)?;
            Ok(DateRange::days(
                first,
                today,
                format!("Last {} Days Report - {} to {}", days, first, today),
            ))
        }
    }
}

/// Parses a date/time string, trying in order: RFC 3339, naive date-times,
/// plain dates (ISO first, then day-first), and finally unix milliseconds.
pub fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(parsed.and_utc());
    }

    if let Some(day) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(start_of_day(day));
    }

    raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 on `day`. Stays on `day`, so it cannot overflow at
/// `NaiveDate::MAX`.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    day.and_time(last_milli).and_utc()
}

fn month_bounds(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(day.year(), day.month(), 1)?;
    let next_month = if day.month() == 12 {
        NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}

fn parse_day(raw: &str) -> Result<NaiveDate, ReportError> {
    parse_flexible_date(raw)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ReportError::InvalidDate(raw.trim().to_string()))
}

fn optional_day(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ReportError> {
    match non_blank(raw) {
        Some(raw) => parse_day(raw),
        None => Ok(today),
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}
