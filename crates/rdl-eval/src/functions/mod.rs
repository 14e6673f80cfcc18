//! Built-in Function Implementations
//!
//! One module per scanner category:
//! - Aggregate functions (`Sum`, `Count`, `First`, ...) over scoped rows
//! - Program flow (`Switch`, `Choose`; `IIf` is reduced by the visitor)
//! - Inspection (`IsNothing`, `IsNumeric`, `IsDate`)
//! - Date/time, text, math and conversion functions
//!
//! Non-aggregate functions receive their arguments already evaluated. A
//! function that cannot make sense of its arguments returns Nothing; only
//! the explicit conversions fail.

pub mod aggregate;
pub mod conversion;
pub mod datetime;
pub mod flow;
pub mod inspection;
pub mod math;
pub mod text;

use rdl_types::{to_f64, ReportValue};

static NOTHING: ReportValue = ReportValue::Null;

/// Argument `index`, Nothing when absent
pub(crate) fn arg(args: &[ReportValue], index: usize) -> &ReportValue {
    args.get(index).unwrap_or(&NOTHING)
}

/// Argument `index` as a whole number, truncating fractions
pub(crate) fn int_arg(args: &[ReportValue], index: usize) -> Option<i64> {
    to_f64(arg(args, index))
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i64)
}

pub(crate) fn text_arg(args: &[ReportValue], index: usize) -> String {
    arg(args, index).to_text()
}
