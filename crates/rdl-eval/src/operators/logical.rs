//! Logical Operators
//!
//! Implements: And, AndAlso, Or, OrElse, Xor, Not
//!
//! Both operands are coerced to Boolean (Nothing and non-boolean text count
//! as False) and both are always evaluated; `AndAlso`/`OrElse` share the
//! truth tables of `And`/`Or`.

use rdl_ast::BinaryOp;
use rdl_types::{is_truthy, to_bool, ReportValue};

pub fn apply(op: BinaryOp, left: &ReportValue, right: &ReportValue) -> ReportValue {
    let (a, b) = (is_truthy(left), is_truthy(right));
    let result = match op {
        BinaryOp::And | BinaryOp::AndAlso => a && b,
        BinaryOp::Or | BinaryOp::OrElse => a || b,
        BinaryOp::Xor => a != b,
        _ => return ReportValue::Null,
    };
    ReportValue::Boolean(result)
}

/// `Not x`; Nothing stays Nothing
pub fn not(value: &ReportValue) -> ReportValue {
    to_bool(value)
        .map(|b| ReportValue::Boolean(!b))
        .unwrap_or(ReportValue::Null)
}
