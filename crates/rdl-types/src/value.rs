//! Runtime values produced by expression evaluation
//!
//! Every fragment of an expression reduces to a [`ReportValue`]. The set is
//! closed: report data, parameters and globals are all mapped onto these
//! variants before evaluation starts.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::format_datetime;

/// A typed value flowing through the expression engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ReportValue {
    /// Missing or unknown value (`Nothing`)
    #[default]
    Null,
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// Double precision float, the result type of widened arithmetic
    Double(f64),
    /// Exact decimal (`CDec`, currency columns)
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
}

/// The resolved type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Double,
    Decimal,
    String,
    DateTime,
}

impl ValueType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Null => "Nothing",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::DateTime => "DateTime",
        }
    }

    /// Integer, Double and Decimal form the numeric family
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Double | Self::Decimal)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ReportValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the resolved type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Double(_) => ValueType::Double,
            Self::Decimal(_) => ValueType::Decimal,
            Self::String(_) => ValueType::String,
            Self::DateTime(_) => ValueType::DateTime,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.value_type().is_numeric()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of a numeric-family value, without parsing strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn null() -> Self {
        Self::Null
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    pub fn double(value: f64) -> Self {
        Self::Double(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Textual form used for concatenation, grouping and default output
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Whether the value renders as an empty string
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(true) => f.write_str("True"),
            Self::Boolean(false) => f.write_str("False"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Double(d) if d.is_nan() => f.write_str("NaN"),
            Self::Double(d) if d.is_infinite() => {
                f.write_str(if *d > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Double(d) => write!(f, "{}", d),
            Self::Decimal(d) => write!(f, "{}", d.normalize()),
            Self::String(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&format_datetime(dt, "G")),
        }
    }
}

impl PartialEq for ReportValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Integer(a), Self::Decimal(b)) | (Self::Decimal(b), Self::Integer(a)) => {
                Decimal::from(*a) == *b
            }
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }
}

impl From<bool> for ReportValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ReportValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ReportValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Decimal> for ReportValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDateTime> for ReportValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<ReportValue>> From<Option<T>> for ReportValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// JSON rows map numbers onto Integer when they fit, Double otherwise.
/// Nested arrays and objects are kept as their JSON text.
impl From<serde_json::Value> for ReportValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Double).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::String(s),
            other => Self::String(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_display_forms() {
        assert_eq!(ReportValue::Null.to_string(), "");
        assert_eq!(ReportValue::Boolean(true).to_string(), "True");
        assert_eq!(ReportValue::Double(14.0).to_string(), "14");
        assert_eq!(ReportValue::Double(2.5).to_string(), "2.5");
        assert_eq!(
            ReportValue::Decimal(Decimal::new(12500, 3)).to_string(),
            "12.5"
        );
    }

    #[test]
    fn test_datetime_default_display() {
        let dt = NaiveDate::from_ymd_opt(2013, 1, 15)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .map(ReportValue::DateTime)
            .unwrap();
        assert_eq!(dt.to_string(), "1/15/2013 2:05:09 PM");
    }

    #[test]
    fn test_numeric_cross_type_equality() {
        assert_eq!(ReportValue::Integer(3), ReportValue::Double(3.0));
        assert_eq!(ReportValue::Integer(3), ReportValue::Decimal(Decimal::from(3)));
        assert_ne!(ReportValue::Integer(3), ReportValue::string("3"));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(ReportValue::from(serde_json::json!(5)), ReportValue::Integer(5));
        assert_eq!(ReportValue::from(serde_json::json!(1.5)), ReportValue::Double(1.5));
        assert_eq!(ReportValue::from(serde_json::json!(null)), ReportValue::Null);
        assert_eq!(
            ReportValue::from(serde_json::json!("A")),
            ReportValue::string("A")
        );
    }
}
