//! Coercion rules
//!
//! Implicit conversions used by arithmetic (widening to double), comparison
//! (coercing the right operand to the left operand's type) and logical
//! operators (truthiness), plus the explicit conversions behind `CInt`,
//! `CDbl`, `CDec`, `CBool`, `CDate`, `CChar` and `CStr`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ReportValue, ValueType};

/// Coercion errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// The value cannot be represented in the target type
    #[error("Cannot convert '{value}' from {from} to {to}")]
    CannotConvert {
        value: String,
        from: ValueType,
        to: ValueType,
    },

    /// The converted value does not fit the target range
    #[error("Value '{value}' overflows {to}")]
    Overflow { value: String, to: ValueType },
}

pub type CoercionResult<T> = Result<T, CoercionError>;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y/%m/%d",
    "%A, %B %d, %Y",
];

/// Parse date/time text the way report data and literals commonly spell it
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .or_else(|| text.replace(',', "").parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Widen a value to double. Booleans widen to 1/0, numeric text is parsed.
pub fn to_f64(value: &ReportValue) -> Option<f64> {
    match value {
        ReportValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        ReportValue::String(s) => parse_number(s),
        other => other.as_f64(),
    }
}

pub fn to_decimal(value: &ReportValue) -> Option<Decimal> {
    match value {
        ReportValue::Decimal(d) => Some(*d),
        ReportValue::Integer(i) => Some(Decimal::from(*i)),
        ReportValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .ok()
            .or_else(|| parse_number(s).and_then(Decimal::from_f64)),
        other => to_f64(other).and_then(Decimal::from_f64),
    }
}

/// Truthiness used by logical operators and conditions
pub fn to_bool(value: &ReportValue) -> Option<bool> {
    match value {
        ReportValue::Null | ReportValue::DateTime(_) => None,
        ReportValue::Boolean(b) => Some(*b),
        ReportValue::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                parse_number(s).map(|n| n != 0.0)
            }
        }
        other => other.as_f64().map(|n| n != 0.0),
    }
}

/// Truthiness with Null and non-boolean text counting as false
pub fn is_truthy(value: &ReportValue) -> bool {
    to_bool(value).unwrap_or(false)
}

pub fn to_datetime(value: &ReportValue) -> Option<NaiveDateTime> {
    match value {
        ReportValue::DateTime(dt) => Some(*dt),
        ReportValue::String(s) => parse_datetime(s),
        _ => None,
    }
}

/// Whether the value is a number or numeric text
pub fn is_numeric_value(value: &ReportValue) -> bool {
    match value {
        ReportValue::String(s) => parse_number(s).is_some(),
        ReportValue::Boolean(_) => true,
        other => other.is_numeric(),
    }
}

pub fn is_date_value(value: &ReportValue) -> bool {
    to_datetime(value).is_some()
}

impl ReportValue {
    fn cannot_convert(&self, to: ValueType) -> CoercionError {
        CoercionError::CannotConvert {
            value: self.to_text(),
            from: self.value_type(),
            to,
        }
    }

    /// Explicit conversion to `target`.
    ///
    /// Integer conversion rounds half to even. Null converts to the target's
    /// zero value except for DateTime, which has none.
    pub fn convert_to(&self, target: ValueType) -> CoercionResult<ReportValue> {
        match target {
            ValueType::Null => Ok(ReportValue::Null),
            ValueType::String => Ok(ReportValue::String(self.to_text())),
            ValueType::Boolean => match self {
                ReportValue::Null => Ok(ReportValue::Boolean(false)),
                other => to_bool(other)
                    .map(ReportValue::Boolean)
                    .ok_or_else(|| other.cannot_convert(target)),
            },
            ValueType::Integer => match self {
                ReportValue::Null => Ok(ReportValue::Integer(0)),
                ReportValue::Integer(i) => Ok(ReportValue::Integer(*i)),
                ReportValue::Boolean(b) => Ok(ReportValue::Integer(if *b { -1 } else { 0 })),
                other => {
                    let n = to_f64(other).ok_or_else(|| other.cannot_convert(target))?;
                    let rounded = n.round_ties_even();
                    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
                        return Err(CoercionError::Overflow {
                            value: other.to_text(),
                            to: target,
                        });
                    }
                    Ok(ReportValue::Integer(rounded as i64))
                }
            },
            ValueType::Double => match self {
                ReportValue::Null => Ok(ReportValue::Double(0.0)),
                other => to_f64(other)
                    .map(ReportValue::Double)
                    .ok_or_else(|| other.cannot_convert(target)),
            },
            ValueType::Decimal => match self {
                ReportValue::Null => Ok(ReportValue::Decimal(Decimal::ZERO)),
                other => to_decimal(other)
                    .map(ReportValue::Decimal)
                    .ok_or_else(|| other.cannot_convert(target)),
            },
            ValueType::DateTime => to_datetime(self)
                .map(ReportValue::DateTime)
                .ok_or_else(|| self.cannot_convert(target)),
        }
    }

    /// Explicit conversion to a single-character string (`CChar`)
    pub fn convert_to_char(&self) -> CoercionResult<ReportValue> {
        let text = self.to_text();
        match text.chars().next() {
            Some(c) => Ok(ReportValue::String(c.to_string())),
            None => Err(self.cannot_convert(ValueType::String)),
        }
    }
}

/// Convert a double result back to an integer when it is integral and fits
pub fn integral(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.is_finite() {
        value.to_i64()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_month_date() {
        let dt = parse_datetime("January 15, 2010").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2010, 1, 15).unwrap());
    }

    #[test]
    fn test_integer_conversion_rounds_half_even() {
        assert_eq!(
            ReportValue::string("2.5").convert_to(ValueType::Integer),
            Ok(ReportValue::Integer(2))
        );
        assert_eq!(
            ReportValue::Double(3.5).convert_to(ValueType::Integer),
            Ok(ReportValue::Integer(4))
        );
    }

    #[test]
    fn test_bool_from_text() {
        assert_eq!(to_bool(&ReportValue::string("TRUE")), Some(true));
        assert_eq!(to_bool(&ReportValue::string("0")), Some(false));
        assert_eq!(to_bool(&ReportValue::string("maybe")), None);
    }
}
