//! Conversion Functions
//!
//! Implements: CInt, CLng, CDbl, CDec, CBool, CDate, CChar, CStr
//!
//! Unlike every other built-in, a conversion that cannot succeed is an
//! error: it raises [`EvalError::ConversionFailure`] to the caller. `CStr`
//! never fails.

use rdl_ast::BuiltinFunction;
use rdl_types::{ReportValue, ValueType};

use super::arg;
use crate::error::{EvalError, EvalResult};

pub fn call(function: BuiltinFunction, args: &[ReportValue]) -> EvalResult<ReportValue> {
    let value = arg(args, 0);
    let name = function.name();

    let converted = match function {
        BuiltinFunction::CStr => return Ok(ReportValue::String(value.to_text())),
        BuiltinFunction::CInt => {
            let converted = value.convert_to(ValueType::Integer);
            return match converted {
                Ok(ReportValue::Integer(i)) if i32::try_from(i).is_err() => Err(
                    EvalError::conversion_failure(name, value.to_text(), "value overflows Int32"),
                ),
                other => other.map_err(|e| EvalError::from_coercion(name, e)),
            };
        }
        BuiltinFunction::CLng => value.convert_to(ValueType::Integer),
        BuiltinFunction::CDbl => value.convert_to(ValueType::Double),
        BuiltinFunction::CDec => value.convert_to(ValueType::Decimal),
        BuiltinFunction::CBool => value.convert_to(ValueType::Boolean),
        // Nothing has no date form; keep it Nothing rather than failing
        BuiltinFunction::CDate if value.is_null() => return Ok(ReportValue::Null),
        BuiltinFunction::CDate => value.convert_to(ValueType::DateTime),
        BuiltinFunction::CChar => value.convert_to_char(),
        other => {
            return Err(EvalError::internal(format!(
                "{} is not a conversion function",
                other.name()
            )));
        }
    };
    converted.map_err(|e| EvalError::from_coercion(name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(BuiltinFunction::CInt, ReportValue::string("42"), ReportValue::Integer(42))]
    #[case(BuiltinFunction::CInt, ReportValue::Double(2.5), ReportValue::Integer(2))]
    #[case(BuiltinFunction::CInt, ReportValue::Double(3.5), ReportValue::Integer(4))]
    #[case(BuiltinFunction::CInt, ReportValue::Boolean(true), ReportValue::Integer(-1))]
    #[case(BuiltinFunction::CLng, ReportValue::Null, ReportValue::Integer(0))]
    #[case(BuiltinFunction::CDbl, ReportValue::string("1,234.5"), ReportValue::Double(1234.5))]
    #[case(BuiltinFunction::CBool, ReportValue::string("False"), ReportValue::Boolean(false))]
    #[case(BuiltinFunction::CStr, ReportValue::Integer(7), ReportValue::string("7"))]
    #[case(BuiltinFunction::CChar, ReportValue::string("xyz"), ReportValue::string("x"))]
    #[case(BuiltinFunction::CDate, ReportValue::Null, ReportValue::Null)]
    fn test_conversions(
        #[case] function: BuiltinFunction,
        #[case] input: ReportValue,
        #[case] expected: ReportValue,
    ) {
        assert_eq!(call(function, &[input]).unwrap(), expected);
    }

    #[test]
    fn test_cdate_parses_text() {
        let expected = NaiveDate::from_ymd_opt(2010, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            call(BuiltinFunction::CDate, &[ReportValue::string("January 15, 2010")]).unwrap(),
            ReportValue::DateTime(expected)
        );
    }

    #[rstest]
    #[case(BuiltinFunction::CInt, ReportValue::string("abc"))]
    #[case(BuiltinFunction::CInt, ReportValue::Double(3e10))]
    #[case(BuiltinFunction::CDbl, ReportValue::string("n/a"))]
    #[case(BuiltinFunction::CBool, ReportValue::string("maybe"))]
    #[case(BuiltinFunction::CDate, ReportValue::string("not a date"))]
    #[case(BuiltinFunction::CChar, ReportValue::string(""))]
    fn test_conversion_failures(#[case] function: BuiltinFunction, #[case] input: ReportValue) {
        let err = call(function, &[input]).unwrap_err();
        assert!(err.is_conversion_failure(), "{err}");
    }
}
