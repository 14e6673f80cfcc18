//! Inspection Functions
//!
//! Implements: IsNothing, IsNumeric, IsDate

use rdl_ast::BuiltinFunction;
use rdl_types::{is_date_value, is_numeric_value, ReportValue};

use super::arg;

pub fn call(function: BuiltinFunction, args: &[ReportValue]) -> ReportValue {
    let value = arg(args, 0);
    let result = match function {
        BuiltinFunction::IsNothing => value.is_null(),
        BuiltinFunction::IsNumeric => is_numeric_value(value),
        BuiltinFunction::IsDate => is_date_value(value),
        _ => return ReportValue::Null,
    };
    ReportValue::Boolean(result)
}
