//! Date/Time Functions
//!
//! Implements: Now, Today, Year, Month, Day, Hour, Minute, Second, DateAdd,
//! DateDiff, DatePart, DateSerial, MonthName, WeekdayName, Weekday,
//! FormatDateTime
//!
//! `Now` and `Today` read the request's execution time so every cell of one
//! render sees the same clock. Date arguments may be DateTime values or
//! date text (`"January 15, 2010"`, `"2010-01-15"`).

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::debug;
use rdl_ast::BuiltinFunction;
use rdl_types::{format_datetime, is_truthy, to_datetime, ReportValue};

use super::{arg, int_arg, text_arg};
use crate::context::EvaluationContext;

/// `DateAdd`/`DateDiff`/`DatePart` interval codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Year,
    Quarter,
    Month,
    DayOfYear,
    Day,
    Weekday,
    WeekOfYear,
    Hour,
    Minute,
    Second,
}

impl Interval {
    pub fn parse(text: &str) -> Option<Self> {
        let interval = match text.trim().to_ascii_lowercase().as_str() {
            "yyyy" | "year" => Self::Year,
            "q" | "quarter" => Self::Quarter,
            "m" | "month" => Self::Month,
            "y" | "dayofyear" => Self::DayOfYear,
            "d" | "day" => Self::Day,
            "w" | "weekday" => Self::Weekday,
            "ww" | "weekofyear" => Self::WeekOfYear,
            "h" | "hour" => Self::Hour,
            "n" | "minute" => Self::Minute,
            "s" | "second" => Self::Second,
            _ => return None,
        };
        Some(interval)
    }
}

pub fn call(function: BuiltinFunction, args: &[ReportValue], ctx: &EvaluationContext<'_>) -> ReportValue {
    let date = || to_datetime(arg(args, 0));
    let component = |f: fn(&NaiveDateTime) -> u32| {
        date()
            .map(|dt| ReportValue::Integer(i64::from(f(&dt))))
            .unwrap_or(ReportValue::Null)
    };

    match function {
        BuiltinFunction::Now => ReportValue::DateTime(ctx.globals.execution_time),
        BuiltinFunction::Today => {
            ReportValue::DateTime(ctx.globals.execution_time.date().and_time(NaiveTime::MIN))
        }
        BuiltinFunction::Year => date()
            .map(|dt| ReportValue::Integer(i64::from(dt.year())))
            .unwrap_or(ReportValue::Null),
        BuiltinFunction::Month => component(|dt| dt.month()),
        BuiltinFunction::Day => component(|dt| dt.day()),
        BuiltinFunction::Hour => component(|dt| dt.hour()),
        BuiltinFunction::Minute => component(|dt| dt.minute()),
        BuiltinFunction::Second => component(|dt| dt.second()),
        BuiltinFunction::Weekday => component(weekday),
        BuiltinFunction::DateAdd => eval_date_add(args),
        BuiltinFunction::DateDiff => eval_date_diff(args),
        BuiltinFunction::DatePart => eval_date_part(args),
        BuiltinFunction::DateSerial => eval_date_serial(args),
        BuiltinFunction::MonthName => {
            name_of(int_arg(args, 0), rdl_types::format::month_name, is_truthy(arg(args, 1)))
        }
        BuiltinFunction::WeekdayName => {
            name_of(int_arg(args, 0), rdl_types::format::weekday_name, is_truthy(arg(args, 1)))
        }
        BuiltinFunction::FormatDateTime => eval_format_date_time(args),
        other => {
            debug!("{} is not a date/time function", other.name());
            ReportValue::Null
        }
    }
}

/// 1 = Sunday
fn weekday(dt: &NaiveDateTime) -> u32 {
    dt.weekday().num_days_from_sunday() + 1
}

fn name_of(index: Option<i64>, lookup: fn(u32) -> Option<&'static str>, abbreviate: bool) -> ReportValue {
    index
        .and_then(|i| u32::try_from(i).ok())
        .and_then(lookup)
        .map(|name| {
            if abbreviate {
                ReportValue::string(&name[..3])
            } else {
                ReportValue::string(name)
            }
        })
        .unwrap_or(ReportValue::Null)
}

fn interval_arg(args: &[ReportValue], function: &str) -> Option<Interval> {
    let text = text_arg(args, 0);
    let interval = Interval::parse(&text);
    if interval.is_none() {
        debug!("{}: unknown interval '{}'", function, text);
    }
    interval
}

/// Shift by whole months, clamping to the end of shorter months
pub fn add_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        dt.checked_add_months(count)
    } else {
        dt.checked_sub_months(count)
    }
}

/// `DateAdd(interval, number, date)`
pub fn date_add(interval: Interval, number: i64, dt: NaiveDateTime) -> Option<NaiveDateTime> {
    let delta = match interval {
        Interval::Year => return add_months(dt, number.checked_mul(12)?),
        Interval::Quarter => return add_months(dt, number.checked_mul(3)?),
        Interval::Month => return add_months(dt, number),
        Interval::DayOfYear | Interval::Day | Interval::Weekday => TimeDelta::try_days(number)?,
        Interval::WeekOfYear => TimeDelta::try_weeks(number)?,
        Interval::Hour => TimeDelta::try_hours(number)?,
        Interval::Minute => TimeDelta::try_minutes(number)?,
        Interval::Second => TimeDelta::try_seconds(number)?,
    };
    dt.checked_add_signed(delta)
}

fn eval_date_add(args: &[ReportValue]) -> ReportValue {
    let result = interval_arg(args, "DateAdd").and_then(|interval| {
        let number = int_arg(args, 1)?;
        let dt = to_datetime(arg(args, 2))?;
        date_add(interval, number, dt)
    });
    result.map(ReportValue::DateTime).unwrap_or(ReportValue::Null)
}

fn quarter(dt: &NaiveDateTime) -> i64 {
    i64::from((dt.month() - 1) / 3 + 1)
}

fn week_start(dt: &NaiveDateTime) -> NaiveDate {
    let date = dt.date();
    date - TimeDelta::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Number of interval boundaries crossed between two dates
pub fn date_diff(interval: Interval, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let months = |dt: &NaiveDateTime| i64::from(dt.year()) * 12 + i64::from(dt.month());
    let seconds = |dt: &NaiveDateTime| dt.and_utc().timestamp();
    match interval {
        Interval::Year => i64::from(end.year() - start.year()),
        Interval::Quarter => {
            (i64::from(end.year()) * 4 + quarter(&end)) - (i64::from(start.year()) * 4 + quarter(&start))
        }
        Interval::Month => months(&end) - months(&start),
        Interval::DayOfYear | Interval::Day => (end.date() - start.date()).num_days(),
        Interval::Weekday => (end.date() - start.date()).num_days() / 7,
        Interval::WeekOfYear => (week_start(&end) - week_start(&start)).num_days() / 7,
        Interval::Hour => seconds(&end).div_euclid(3600) - seconds(&start).div_euclid(3600),
        Interval::Minute => seconds(&end).div_euclid(60) - seconds(&start).div_euclid(60),
        Interval::Second => seconds(&end) - seconds(&start),
    }
}

fn eval_date_diff(args: &[ReportValue]) -> ReportValue {
    let result = interval_arg(args, "DateDiff").and_then(|interval| {
        let start = to_datetime(arg(args, 1))?;
        let end = to_datetime(arg(args, 2))?;
        Some(date_diff(interval, start, end))
    });
    result.map(ReportValue::Integer).unwrap_or(ReportValue::Null)
}

/// Component of a date selected by an interval code
pub fn date_part(interval: Interval, dt: NaiveDateTime) -> i64 {
    match interval {
        Interval::Year => i64::from(dt.year()),
        Interval::Quarter => quarter(&dt),
        Interval::Month => i64::from(dt.month()),
        Interval::DayOfYear => i64::from(dt.ordinal()),
        Interval::Day => i64::from(dt.day()),
        Interval::Weekday => i64::from(weekday(&dt)),
        Interval::WeekOfYear => {
            let jan1 = dt.date().with_ordinal(1).unwrap_or(dt.date());
            let offset = jan1.weekday().num_days_from_sunday();
            i64::from((dt.ordinal0() + offset) / 7 + 1)
        }
        Interval::Hour => i64::from(dt.hour()),
        Interval::Minute => i64::from(dt.minute()),
        Interval::Second => i64::from(dt.second()),
    }
}

fn eval_date_part(args: &[ReportValue]) -> ReportValue {
    interval_arg(args, "DatePart")
        .zip(to_datetime(arg(args, 1)))
        .map(|(interval, dt)| ReportValue::Integer(date_part(interval, dt)))
        .unwrap_or(ReportValue::Null)
}

/// `DateSerial(year, month, day)`; months and days outside their range
/// roll over into neighbouring months and years
pub fn date_serial(year: i64, month: i64, day: i64) -> Option<NaiveDateTime> {
    let year = match year {
        0..=29 => year + 2000,
        30..=99 => year + 1900,
        other => other,
    };
    let base = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)?.and_time(NaiveTime::MIN);
    let shifted = add_months(base, month.checked_sub(1)?)?;
    shifted.checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?)
}

fn eval_date_serial(args: &[ReportValue]) -> ReportValue {
    let parts = (int_arg(args, 0), int_arg(args, 1), int_arg(args, 2));
    match parts {
        (Some(y), Some(m), Some(d)) => date_serial(y, m, d)
            .map(ReportValue::DateTime)
            .unwrap_or(ReportValue::Null),
        _ => ReportValue::Null,
    }
}

fn eval_format_date_time(args: &[ReportValue]) -> ReportValue {
    let Some(dt) = to_datetime(arg(args, 0)) else {
        return ReportValue::Null;
    };
    let pattern = match int_arg(args, 1).unwrap_or(0) {
        1 => "D",
        2 => "d",
        3 => "T",
        4 => "HH:mm",
        _ if dt.time() == NaiveTime::MIN => "d",
        _ => "G",
    };
    ReportValue::String(format_datetime(&dt, pattern))
}
