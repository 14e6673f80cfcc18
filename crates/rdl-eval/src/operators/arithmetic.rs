//! Arithmetic Operators
//!
//! Implements: Add, Subtract, Multiply, Divide, Concatenate, Modulo, Power,
//! Negate and unary Plus.
//!
//! Operands widen to double. Integer `+ - * Mod` stay integral while the
//! result fits. A string on either side of `+` (or `&` anywhere) joins text
//! instead, and once the left operand is text, `- * /` with non-numeric text
//! on the right join as well. Nothing on either side, or a division by zero,
//! yields Nothing.

use log::debug;
use rdl_ast::BinaryOp;
use rdl_types::{is_numeric_value, to_f64, ReportValue};

/// Apply an arithmetic operator to two evaluated operands
pub fn apply(op: BinaryOp, left: &ReportValue, right: &ReportValue) -> ReportValue {
    if concatenates(op, left, right) {
        return concatenate(left, right);
    }
    if left.is_null() || right.is_null() {
        return ReportValue::Null;
    }

    if let (ReportValue::Integer(a), ReportValue::Integer(b)) = (left, right) {
        if let Some(result) = integer_op(op, *a, *b) {
            return result;
        }
    }

    let (Some(a), Some(b)) = (to_f64(left), to_f64(right)) else {
        debug!(
            "Non-numeric operand for '{}': {:?}, {:?}",
            op.symbol(),
            left,
            right
        );
        return ReportValue::Null;
    };

    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide if b == 0.0 => return ReportValue::Null,
        BinaryOp::Divide => a / b,
        BinaryOp::Modulo if b == 0.0 => return ReportValue::Null,
        BinaryOp::Modulo => a % b,
        BinaryOp::Power => a.powf(b),
        _ => return ReportValue::Null,
    };

    if result.is_finite() {
        ReportValue::Double(result)
    } else {
        ReportValue::Null
    }
}

fn concatenates(op: BinaryOp, left: &ReportValue, right: &ReportValue) -> bool {
    let left_text = matches!(left, ReportValue::String(_));
    let right_text = matches!(right, ReportValue::String(_));
    match op {
        BinaryOp::Concatenate => true,
        BinaryOp::Add => left_text || right_text,
        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            left_text && right_text && !is_numeric_value(right)
        }
        _ => false,
    }
}

/// Text join where Nothing contributes an empty string
pub fn concatenate(left: &ReportValue, right: &ReportValue) -> ReportValue {
    let mut text = left.to_text();
    text.push_str(&right.to_text());
    ReportValue::String(text)
}

/// Integer arithmetic, `None` when the operator widens or the result
/// overflows
fn integer_op(op: BinaryOp, a: i64, b: i64) -> Option<ReportValue> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b)?,
        BinaryOp::Subtract => a.checked_sub(b)?,
        BinaryOp::Multiply => a.checked_mul(b)?,
        BinaryOp::Modulo if b == 0 => return Some(ReportValue::Null),
        BinaryOp::Modulo => a.checked_rem(b)?,
        _ => return None,
    };
    Some(ReportValue::Integer(result))
}

/// Unary minus
pub fn negate(value: &ReportValue) -> ReportValue {
    match value {
        ReportValue::Null => ReportValue::Null,
        ReportValue::Integer(i) => i
            .checked_neg()
            .map(ReportValue::Integer)
            .unwrap_or(ReportValue::Double(-(*i as f64))),
        ReportValue::Double(d) => ReportValue::Double(-d),
        ReportValue::Decimal(d) => ReportValue::Decimal(-*d),
        other => to_f64(other)
            .map(|n| ReportValue::Double(-n))
            .unwrap_or(ReportValue::Null),
    }
}

/// Unary plus: numbers pass through, numeric text widens
pub fn identity(value: &ReportValue) -> ReportValue {
    match value {
        v if v.is_numeric() || v.is_null() => v.clone(),
        other => to_f64(other)
            .map(ReportValue::Double)
            .unwrap_or(ReportValue::Null),
    }
}
