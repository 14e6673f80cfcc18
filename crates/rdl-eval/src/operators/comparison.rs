//! Comparison Operators
//!
//! Implements: Equal, NotEqual, Less, LessOrEqual, Greater, GreaterOrEqual,
//! Like and Is, plus the total ordering used for sorting and `Min`/`Max`.
//!
//! A comparison dispatches on the left operand: dates compare
//! chronologically (the right side is coerced to a date), text compares
//! ordinally against the right side's text, numbers compare numerically and
//! anything else only supports equality.

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;
use rdl_ast::BinaryOp;
use rdl_types::{to_datetime, to_f64, ReportValue};
use regex::Regex;

use crate::engine::{ReportEngine, MAX_CACHED_PATTERNS};

impl ReportEngine {
    /// Evaluate a comparison operator on evaluated operands
    pub fn compare(&self, op: BinaryOp, left: &ReportValue, right: &ReportValue) -> ReportValue {
        match op {
            BinaryOp::Like => self.eval_like(left, right),
            BinaryOp::Is => ReportValue::Boolean(is_identical(left, right)),
            _ => ReportValue::Boolean(compare_values(op, left, right)),
        }
    }

    /// Evaluate `text Like pattern`
    ///
    /// Patterns use VB wildcards: `*` any run, `?` one character, `#` one
    /// digit, `[abc]`/`[a-z]` a class and `[!abc]` a negated class. A
    /// pattern that cannot be translated (an unclosed or reversed class)
    /// makes the comparison Nothing.
    pub fn eval_like(&self, left: &ReportValue, right: &ReportValue) -> ReportValue {
        let pattern = right.to_text();
        match self.like_regex(&pattern) {
            Some(regex) => ReportValue::Boolean(regex.is_match(&left.to_text())),
            None => {
                debug!("Invalid Like pattern '{}' evaluates to Nothing", pattern);
                ReportValue::Null
            }
        }
    }

    fn like_regex(&self, pattern: &str) -> Option<Arc<Regex>> {
        if let Some(regex) = self.patterns.read().get(pattern) {
            return Some(Arc::clone(regex));
        }
        let regex = Regex::new(&like_pattern(pattern)?).ok().map(Arc::new)?;

        let mut patterns = self.patterns.write();
        if patterns.len() >= MAX_CACHED_PATTERNS {
            debug!("Like pattern cache full ({} entries), clearing", patterns.len());
            patterns.clear();
        }
        patterns.insert(pattern.to_string(), Arc::clone(&regex));
        Some(regex)
    }
}

/// Outcome of a comparison operator, dispatching on the left operand
pub fn compare_values(op: BinaryOp, left: &ReportValue, right: &ReportValue) -> bool {
    match left {
        ReportValue::Null => match op {
            BinaryOp::Equal => right.is_null(),
            BinaryOp::NotEqual => !right.is_null(),
            _ => false,
        },
        ReportValue::DateTime(l) => holds(op, to_datetime(right).map(|r| l.cmp(&r))),
        ReportValue::String(l) => holds(op, Some(l.as_str().cmp(right.to_text().as_str()))),
        l if l.is_numeric() => holds(
            op,
            to_f64(l)
                .zip(to_f64(right))
                .and_then(|(a, b)| a.partial_cmp(&b)),
        ),
        l => match op {
            BinaryOp::Equal => is_identical(l, right),
            BinaryOp::NotEqual => !is_identical(l, right),
            _ => false,
        },
    }
}

/// Whether an ordering satisfies the operator; an incomparable pair is only
/// "not equal"
fn holds(op: BinaryOp, ordering: Option<Ordering>) -> bool {
    match ordering {
        Some(ord) => match op {
            BinaryOp::Equal => ord == Ordering::Equal,
            BinaryOp::NotEqual => ord != Ordering::Equal,
            BinaryOp::Less => ord == Ordering::Less,
            BinaryOp::LessOrEqual => ord != Ordering::Greater,
            BinaryOp::Greater => ord == Ordering::Greater,
            BinaryOp::GreaterOrEqual => ord != Ordering::Less,
            _ => false,
        },
        None => op == BinaryOp::NotEqual,
    }
}

/// Same type and same value
fn is_identical(left: &ReportValue, right: &ReportValue) -> bool {
    left.value_type() == right.value_type() && left == right
}

/// Translate a VB `Like` pattern into an anchored regular expression.
/// `None` when a character class is left open.
pub fn like_pattern(pattern: &str) -> Option<String> {
    let mut out = String::from("^(?s)");
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '#' => out.push_str("[0-9]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    class.push(inner);
                }
                if !closed {
                    return None;
                }
                out.push('[');
                let body = match class.strip_prefix('!') {
                    Some(rest) => {
                        out.push('^');
                        rest
                    }
                    None => class.as_str(),
                };
                for member in body.chars() {
                    match member {
                        '-' => out.push('-'),
                        '\\' | '^' | '[' | ']' | '&' | '~' => {
                            out.push('\\');
                            out.push(member);
                        }
                        other => out.push(other),
                    }
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    Some(out)
}

fn type_rank(value: &ReportValue) -> u8 {
    match value {
        ReportValue::Boolean(_) => 0,
        ReportValue::Integer(_) | ReportValue::Double(_) | ReportValue::Decimal(_) => 1,
        ReportValue::DateTime(_) => 2,
        ReportValue::String(_) => 3,
        ReportValue::Null => 4,
    }
}

/// Total ascending order over values.
///
/// Text compares ordinally, numbers numerically across the numeric family,
/// dates chronologically. Nothing sorts after every present value; values
/// of unrelated types order by type.
pub fn sort_compare(a: &ReportValue, b: &ReportValue) -> Ordering {
    match (a, b) {
        (ReportValue::String(x), ReportValue::String(y)) => x.cmp(y),
        (ReportValue::DateTime(x), ReportValue::DateTime(y)) => x.cmp(y),
        (ReportValue::Boolean(x), ReportValue::Boolean(y)) => x.cmp(y),
        (ReportValue::Integer(x), ReportValue::Integer(y)) => x.cmp(y),
        (ReportValue::Decimal(x), ReportValue::Decimal(y)) => x.cmp(y),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            let (x, y) = (to_f64(x).unwrap_or(0.0), to_f64(y).unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (x, y) => type_rank(x).cmp(&type_rank(y)),
    }
}
