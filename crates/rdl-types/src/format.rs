//! .NET-style display formatting
//!
//! Report definitions carry `Format` properties written for the .NET
//! runtime: standard date patterns such as `d` or `G`, custom patterns such
//! as `yyyy-MM-dd HH:mm`, and numeric patterns such as `N2`, `C`, `P0` or
//! `#,##0.00`. Output follows the invariant en-US culture.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::ReportValue;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Full English month name for a 1-based month
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

/// Full English weekday name for a 1-based weekday (1 = Sunday)
pub fn weekday_name(weekday: u32) -> Option<&'static str> {
    WEEKDAYS.get(weekday.checked_sub(1)? as usize).copied()
}

/// Format a value with a `Format` property. Values the format does not
/// apply to fall back to their default textual form.
pub fn format_value(value: &ReportValue, format: &str) -> String {
    let format = format.trim();
    if format.is_empty() {
        return value.to_text();
    }
    match value {
        ReportValue::DateTime(dt) => format_datetime(dt, format),
        ReportValue::Integer(i) => {
            format_number(Decimal::from(*i), true, format).unwrap_or_else(|| value.to_text())
        }
        ReportValue::Decimal(d) => format_number(*d, false, format).unwrap_or_else(|| value.to_text()),
        ReportValue::Double(d) => Decimal::from_f64(*d)
            .and_then(|dec| format_number(dec, false, format))
            .unwrap_or_else(|| value.to_text()),
        _ => value.to_text(),
    }
}

fn expand_standard_datetime(format: &str) -> &str {
    match format {
        "d" => "M/d/yyyy",
        "D" => "dddd, MMMM d, yyyy",
        "f" => "dddd, MMMM d, yyyy h:mm tt",
        "F" => "dddd, MMMM d, yyyy h:mm:ss tt",
        "g" => "M/d/yyyy h:mm tt",
        "G" => "M/d/yyyy h:mm:ss tt",
        "M" | "m" => "MMMM d",
        "s" => "yyyy-MM-dd'T'HH:mm:ss",
        "t" => "h:mm tt",
        "T" => "h:mm:ss tt",
        "u" => "yyyy-MM-dd HH:mm:ss'Z'",
        "Y" | "y" => "MMMM yyyy",
        "o" | "O" => "yyyy-MM-dd'T'HH:mm:ss.fffffff",
        other => other,
    }
}

/// Format a date/time with a standard or custom .NET pattern
pub fn format_datetime(dt: &NaiveDateTime, format: &str) -> String {
    let pattern: Vec<char> = expand_standard_datetime(format).chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < pattern.len() {
        let c = pattern[i];
        let run = pattern[i..].iter().take_while(|&&p| p == c).count();
        match c {
            '\'' | '"' => {
                let end = pattern[i + 1..]
                    .iter()
                    .position(|&p| p == c)
                    .map(|p| i + 1 + p)
                    .unwrap_or(pattern.len());
                out.extend(&pattern[i + 1..end]);
                i = end + 1;
                continue;
            }
            '\\' => {
                if let Some(next) = pattern.get(i + 1) {
                    out.push(*next);
                }
                i += 2;
                continue;
            }
            'y' => match run {
                1 => out.push_str(&(dt.year() % 100).to_string()),
                2 => out.push_str(&format!("{:02}", dt.year() % 100)),
                n => out.push_str(&format!("{:0width$}", dt.year(), width = n)),
            },
            'M' => match run {
                1 => out.push_str(&dt.month().to_string()),
                2 => out.push_str(&format!("{:02}", dt.month())),
                3 => out.push_str(&MONTHS[dt.month0() as usize][..3]),
                _ => out.push_str(MONTHS[dt.month0() as usize]),
            },
            'd' => {
                let weekday = dt.weekday().num_days_from_sunday() as usize;
                match run {
                    1 => out.push_str(&dt.day().to_string()),
                    2 => out.push_str(&format!("{:02}", dt.day())),
                    3 => out.push_str(&WEEKDAYS[weekday][..3]),
                    _ => out.push_str(WEEKDAYS[weekday]),
                }
            }
            'h' => {
                let hour = match dt.hour() % 12 {
                    0 => 12,
                    h => h,
                };
                if run == 1 {
                    out.push_str(&hour.to_string());
                } else {
                    out.push_str(&format!("{:02}", hour));
                }
            }
            'H' => push_padded(&mut out, dt.hour(), run),
            'm' => push_padded(&mut out, dt.minute(), run),
            's' => push_padded(&mut out, dt.second(), run),
            'f' | 'F' => {
                let digits = run.min(7);
                let fraction = format!("{:09}", dt.nanosecond() % 1_000_000_000);
                let mut part = fraction[..digits].to_string();
                if c == 'F' {
                    part = part.trim_end_matches('0').to_string();
                }
                out.push_str(&part);
            }
            't' => {
                let marker = if dt.hour() < 12 { "AM" } else { "PM" };
                if run == 1 {
                    out.push_str(&marker[..1]);
                } else {
                    out.push_str(marker);
                }
            }
            other => {
                for _ in 0..run {
                    out.push(other);
                }
            }
        }
        i += run;
    }

    out
}

fn push_padded(out: &mut String, value: u32, run: usize) {
    if run == 1 {
        out.push_str(&value.to_string());
    } else {
        out.push_str(&format!("{:02}", value));
    }
}

/// Format a number with a standard (`N2`, `C`, `P1`, `F3`, `D5`, `E2`, `X`)
/// or custom (`#,##0.00`, `0.0%`) .NET pattern. Returns `None` when the
/// pattern does not apply to the value.
fn format_number(value: Decimal, is_integer: bool, format: &str) -> Option<String> {
    let mut chars = format.chars();
    let spec = chars.next()?;
    let precision_text: String = chars.collect();
    let standard = precision_text.chars().all(|c| c.is_ascii_digit()) && spec.is_ascii_alphabetic();

    if !standard {
        return Some(format_custom_number(value, format));
    }

    let precision = precision_text.parse::<u32>().ok();
    let formatted = match spec.to_ascii_uppercase() {
        'N' => group_fixed(value, precision.unwrap_or(2), true),
        'F' => group_fixed(value, precision.unwrap_or(2), false),
        'C' => {
            let body = group_fixed(value.abs(), precision.unwrap_or(2), true);
            if value.is_sign_negative() && !value.is_zero() {
                format!("-${}", body)
            } else {
                format!("${}", body)
            }
        }
        'P' => format!(
            "{}%",
            group_fixed(value * Decimal::ONE_HUNDRED, precision.unwrap_or(2), true)
        ),
        'D' if is_integer => {
            let digits = value.abs().trunc().to_string();
            let width = precision.unwrap_or(0) as usize;
            let sign = if value.is_sign_negative() && !value.is_zero() { "-" } else { "" };
            format!("{}{:0>width$}", sign, digits, width = width)
        }
        'X' if is_integer => {
            let n = value.trunc().to_i64()?;
            let width = precision.unwrap_or(0) as usize;
            if spec == 'x' {
                format!("{:0width$x}", n, width = width)
            } else {
                format!("{:0width$X}", n, width = width)
            }
        }
        'E' => {
            let f = value.to_f64()?;
            let text = format!("{:.*e}", precision.unwrap_or(6) as usize, f);
            normalize_exponent(&text, spec == 'e')
        }
        'G' => value.normalize().to_string(),
        _ => return None,
    };
    Some(formatted)
}

fn normalize_exponent(text: &str, lower: bool) -> String {
    let (mantissa, exponent) = match text.split_once('e') {
        Some(parts) => parts,
        None => return text.to_string(),
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(rest) => ('-', rest),
        None => ('+', exponent),
    };
    let marker = if lower { 'e' } else { 'E' };
    format!("{}{}{}{:0>3}", mantissa, marker, sign, digits)
}

fn round(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-point rendering with optional thousands grouping
fn group_fixed(value: Decimal, decimals: u32, grouping: bool) -> String {
    let rounded = round(value, decimals);
    let text = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text.clone(), None),
    };
    let int_part = if grouping { group_digits(&int_part) } else { int_part };
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac_part {
        Some(frac) if decimals > 0 => format!("{}{}.{}", sign, int_part, frac),
        _ => format!("{}{}", sign, int_part),
    }
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Custom numeric patterns: `0` and `#` placeholders, `.` decimal point,
/// `,` grouping, `%` percent, `;` separated positive/negative sections and
/// literal text around the placeholders.
fn format_custom_number(value: Decimal, format: &str) -> String {
    let sections: Vec<&str> = format.split(';').collect();
    let (pattern, negative_section) = if value.is_sign_negative() && !value.is_zero() && sections.len() > 1 {
        (sections[1], true)
    } else {
        (sections[0], false)
    };

    let placeholder = |c: char| matches!(c, '0' | '#' | '.' | ',');
    let first = pattern.find(|c: char| c == '0' || c == '#');
    let last = pattern.rfind(|c: char| c == '0' || c == '#');
    let (start, end) = match (first, last) {
        (Some(s), Some(e)) => (s, e + 1),
        _ => return pattern.to_string(),
    };

    let prefix = &pattern[..start];
    let body: String = pattern[start..end].chars().filter(|c| placeholder(*c)).collect();
    let suffix = &pattern[end..];

    let mut value = value;
    if pattern.contains('%') {
        value *= Decimal::ONE_HUNDRED;
    }
    if negative_section {
        value = value.abs();
    }

    let (int_pattern, frac_pattern) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body.as_str(), ""),
    };
    let max_decimals = frac_pattern.chars().filter(|c| *c == '0' || *c == '#').count() as u32;
    let min_decimals = frac_pattern.chars().take_while(|c| *c == '0').count();
    let min_int_digits = int_pattern.chars().filter(|c| *c == '0').count();
    let grouping = int_pattern.contains(',');

    let rounded = round(value, max_decimals);
    let text = format!("{:.*}", max_decimals as usize, rounded.abs());
    let (int_digits, frac_digits) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut int_digits = int_digits.trim_start_matches('0').to_string();
    while int_digits.len() < min_int_digits {
        int_digits.insert(0, '0');
    }
    if grouping && !int_digits.is_empty() {
        int_digits = group_digits(&int_digits);
    }

    let mut frac_digits = frac_digits;
    while frac_digits.len() > min_decimals && frac_digits.ends_with('0') {
        frac_digits.pop();
    }

    let mut number = int_digits;
    if !frac_digits.is_empty() {
        number.push('.');
        number.push_str(&frac_digits);
    }
    if number.is_empty() {
        number.push('0');
    }

    let sign = if !negative_section && rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let prefix = prefix.replace(['\'', '"'], "");
    let suffix = suffix.replace(['\'', '"'], "");
    format!("{}{}{}{}", sign, prefix, number, suffix)
}
