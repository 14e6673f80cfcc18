//! Math Functions
//!
//! Implements: Abs, Round, Floor, Ceiling, Sqrt, Pow, Int, Fix, Sign
//!
//! Integer arguments stay Integer where the result is integral; everything
//! else is computed in double precision. `Round` uses banker's rounding.

use log::debug;
use rdl_ast::BuiltinFunction;
use rdl_types::{to_decimal, to_f64, ReportValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;

use super::{arg, int_arg};

pub fn call(function: BuiltinFunction, args: &[ReportValue]) -> ReportValue {
    let value = arg(args, 0);
    if value.is_null() {
        return ReportValue::Null;
    }

    match function {
        BuiltinFunction::Abs => match value {
            ReportValue::Integer(i) => i
                .checked_abs()
                .map(ReportValue::Integer)
                .unwrap_or(ReportValue::Double((*i as f64).abs())),
            ReportValue::Decimal(d) => ReportValue::Decimal(d.abs()),
            other => unary(other, f64::abs),
        },
        BuiltinFunction::Round => round(value, int_arg(args, 1).unwrap_or(0)),
        BuiltinFunction::Floor | BuiltinFunction::Int => integral(value, f64::floor),
        BuiltinFunction::Ceiling => integral(value, f64::ceil),
        BuiltinFunction::Fix => integral(value, f64::trunc),
        BuiltinFunction::Sqrt => match to_f64(value) {
            Some(n) if n >= 0.0 => ReportValue::Double(n.sqrt()),
            _ => {
                debug!("Sqrt of a negative or non-numeric value");
                ReportValue::Null
            }
        },
        BuiltinFunction::Pow => match (to_f64(value), to_f64(arg(args, 1))) {
            (Some(x), Some(y)) => finite(x.powf(y)),
            _ => ReportValue::Null,
        },
        BuiltinFunction::Sign => match to_f64(value) {
            Some(n) if n > 0.0 => ReportValue::Integer(1),
            Some(n) if n < 0.0 => ReportValue::Integer(-1),
            Some(_) => ReportValue::Integer(0),
            None => ReportValue::Null,
        },
        other => {
            debug!("{} is not a math function", other.name());
            ReportValue::Null
        }
    }
}

fn finite(n: f64) -> ReportValue {
    if n.is_finite() {
        ReportValue::Double(n)
    } else {
        ReportValue::Null
    }
}

fn unary(value: &ReportValue, f: fn(f64) -> f64) -> ReportValue {
    to_f64(value).map(f).map(finite).unwrap_or(ReportValue::Null)
}

/// Floor/Ceiling/Fix: integers pass through unchanged
fn integral(value: &ReportValue, f: fn(f64) -> f64) -> ReportValue {
    match value {
        ReportValue::Integer(_) => value.clone(),
        other => unary(other, f),
    }
}

/// Round half to even at `digits` decimal places
pub fn round(value: &ReportValue, digits: i64) -> ReportValue {
    let Ok(digits) = u32::try_from(digits) else {
        return ReportValue::Null;
    };
    if let ReportValue::Integer(_) = value {
        return value.clone();
    }
    let Some(decimal) = to_decimal(value) else {
        return ReportValue::Null;
    };
    let rounded = decimal.round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven);
    match value {
        ReportValue::Decimal(_) => ReportValue::Decimal(rounded),
        _ => rounded
            .to_f64()
            .map(ReportValue::Double)
            .unwrap_or(ReportValue::Null),
    }
}
