//! Coercion and conversion tests
//!
//! - Widening to double for arithmetic
//! - Truthiness for logical operators
//! - Explicit conversions and their failures
//! - Date parsing of common report spellings

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rdl_types::*;
use rstest::rstest;
use rust_decimal::Decimal;

// === Widening ===

#[rstest]
#[case(ReportValue::Integer(3), Some(3.0))]
#[case(ReportValue::Double(2.5), Some(2.5))]
#[case(ReportValue::Decimal(Decimal::new(125, 2)), Some(1.25))]
#[case(ReportValue::string(" 42 "), Some(42.0))]
#[case(ReportValue::string("1,250.5"), Some(1250.5))]
#[case(ReportValue::Boolean(true), Some(1.0))]
#[case(ReportValue::string("abc"), None)]
#[case(ReportValue::Null, None)]
fn test_widen_to_double(#[case] value: ReportValue, #[case] expected: Option<f64>) {
    assert_eq!(to_f64(&value), expected);
}

// === Truthiness ===

#[rstest]
#[case(ReportValue::Boolean(true), true)]
#[case(ReportValue::Integer(0), false)]
#[case(ReportValue::Integer(-1), true)]
#[case(ReportValue::string("False"), false)]
#[case(ReportValue::string("true"), true)]
#[case(ReportValue::Null, false)]
#[case(ReportValue::string("yes"), false)]
fn test_truthiness(#[case] value: ReportValue, #[case] expected: bool) {
    assert_eq!(is_truthy(&value), expected);
}

// === Explicit conversions ===

#[test]
fn test_convert_to_integer_failure_is_typed() {
    let err = ReportValue::string("abc")
        .convert_to(ValueType::Integer)
        .unwrap_err();
    assert_eq!(
        err,
        CoercionError::CannotConvert {
            value: "abc".to_string(),
            from: ValueType::String,
            to: ValueType::Integer,
        }
    );
}

#[test]
fn test_convert_to_decimal_keeps_precision() {
    assert_eq!(
        ReportValue::string("19.990").convert_to(ValueType::Decimal),
        Ok(ReportValue::Decimal(Decimal::new(19990, 3)))
    );
}

#[test]
fn test_convert_to_string_never_fails() {
    assert_eq!(
        ReportValue::Null.convert_to(ValueType::String),
        Ok(ReportValue::string(""))
    );
    assert_eq!(
        ReportValue::Double(1.5).convert_to(ValueType::String),
        Ok(ReportValue::string("1.5"))
    );
}

#[test]
fn test_convert_to_char() {
    assert_eq!(
        ReportValue::string("Report").convert_to_char(),
        Ok(ReportValue::string("R"))
    );
    assert!(ReportValue::string("").convert_to_char().is_err());
}

#[test]
fn test_convert_to_date() {
    let expected = NaiveDate::from_ymd_opt(2012, 3, 4)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    assert_eq!(
        ReportValue::string("3/4/2012").convert_to(ValueType::DateTime),
        Ok(ReportValue::DateTime(expected))
    );
    assert!(ReportValue::string("not a date")
        .convert_to(ValueType::DateTime)
        .is_err());
}

// === Date parsing ===

#[rstest]
#[case("2010-01-15", (2010, 1, 15))]
#[case("2010-01-15T08:30:00", (2010, 1, 15))]
#[case("1/15/2010", (2010, 1, 15))]
#[case("January 15, 2010", (2010, 1, 15))]
#[case("Jan 15, 2010", (2010, 1, 15))]
fn test_parse_datetime_spellings(#[case] text: &str, #[case] ymd: (i32, u32, u32)) {
    let parsed = parse_datetime(text).expect("date should parse");
    assert_eq!(
        parsed.date(),
        NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap()
    );
}

#[test]
fn test_inspection_helpers() {
    assert!(is_numeric_value(&ReportValue::string("12.5")));
    assert!(!is_numeric_value(&ReportValue::string("12a")));
    assert!(is_date_value(&ReportValue::string("2020-02-29")));
    assert!(!is_date_value(&ReportValue::Integer(5)));
}
