//! Text Functions
//!
//! Implements: Len, Left, Right, Mid, UCase, LCase, Trim, LTrim, RTrim,
//! Replace, InStr, StrReverse, Format, Space
//!
//! Positions are 1-based and count characters, not bytes.

use log::debug;
use rdl_ast::BuiltinFunction;
use rdl_types::{format_value, ReportValue};

use super::{arg, int_arg, text_arg};

/// Longest run `Space` produces; larger requests are Nothing
pub const MAX_SPACE_LENGTH: usize = 1 << 20;

pub fn call(function: BuiltinFunction, args: &[ReportValue]) -> ReportValue {
    let first = arg(args, 0);
    let text = || first.to_text();

    match function {
        BuiltinFunction::Len => ReportValue::Integer(text().chars().count() as i64),
        BuiltinFunction::Left => take(args, |s, n| s.chars().take(n).collect()),
        BuiltinFunction::Right => take(args, |s, n| {
            let skip = s.chars().count().saturating_sub(n);
            s.chars().skip(skip).collect()
        }),
        BuiltinFunction::Mid => eval_mid(args),
        BuiltinFunction::UCase => map_text(first, |s| s.to_uppercase()),
        BuiltinFunction::LCase => map_text(first, |s| s.to_lowercase()),
        BuiltinFunction::Trim => map_text(first, |s| s.trim_matches(' ').to_string()),
        BuiltinFunction::LTrim => map_text(first, |s| s.trim_start_matches(' ').to_string()),
        BuiltinFunction::RTrim => map_text(first, |s| s.trim_end_matches(' ').to_string()),
        BuiltinFunction::StrReverse => map_text(first, |s| s.chars().rev().collect()),
        BuiltinFunction::Replace => {
            if first.is_null() {
                return ReportValue::Null;
            }
            let find = text_arg(args, 1);
            if find.is_empty() {
                return ReportValue::String(text());
            }
            ReportValue::String(text().replace(&find, &text_arg(args, 2)))
        }
        BuiltinFunction::InStr => eval_instr(args),
        BuiltinFunction::Format => ReportValue::String(format_value(first, &text_arg(args, 1))),
        BuiltinFunction::Space => match int_arg(args, 0).and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n <= MAX_SPACE_LENGTH => ReportValue::String(" ".repeat(n)),
            Some(n) => {
                debug!("Space({}) exceeds {} characters", n, MAX_SPACE_LENGTH);
                ReportValue::Null
            }
            None => ReportValue::Null,
        },
        other => {
            debug!("{} is not a text function", other.name());
            ReportValue::Null
        }
    }
}

/// Nothing stays Nothing; anything else maps its text form
fn map_text(value: &ReportValue, f: impl FnOnce(&str) -> String) -> ReportValue {
    match value {
        ReportValue::Null => ReportValue::Null,
        other => ReportValue::String(f(&other.to_text())),
    }
}

fn take(args: &[ReportValue], f: impl FnOnce(&str, usize) -> String) -> ReportValue {
    match int_arg(args, 1).and_then(|n| usize::try_from(n).ok()) {
        Some(n) => ReportValue::String(f(&text_arg(args, 0), n)),
        None => {
            debug!("Negative or missing length argument");
            ReportValue::Null
        }
    }
}

/// `Mid(text, start[, length])`
fn eval_mid(args: &[ReportValue]) -> ReportValue {
    let start = match int_arg(args, 1) {
        Some(start) if start >= 1 => (start - 1) as usize,
        _ => return ReportValue::Null,
    };
    let text = text_arg(args, 0);
    let rest = text.chars().skip(start);
    match args.get(2) {
        Some(_) => match int_arg(args, 2).and_then(|n| usize::try_from(n).ok()) {
            Some(len) => ReportValue::String(rest.take(len).collect()),
            None => ReportValue::Null,
        },
        None => ReportValue::String(rest.collect()),
    }
}

/// `InStr([start,] text, find)`: 1-based position of `find`, 0 when absent
fn eval_instr(args: &[ReportValue]) -> ReportValue {
    let (start, haystack, needle) = match args.len() {
        3 => (int_arg(args, 0), arg(args, 1), arg(args, 2)),
        _ => (Some(1), arg(args, 0), arg(args, 1)),
    };
    let Some(start) = start.filter(|s| *s >= 1).map(|s| s as usize) else {
        return ReportValue::Null;
    };
    if haystack.is_null() {
        return ReportValue::Integer(0);
    }
    ReportValue::Integer(instr(&haystack.to_text(), &needle.to_text(), start) as i64)
}

pub fn instr(haystack: &str, needle: &str, start: usize) -> usize {
    let char_count = haystack.chars().count();
    if start > char_count {
        return if needle.is_empty() && start == char_count + 1 { start } else { 0 };
    }
    if needle.is_empty() {
        return start;
    }
    let byte_start = haystack
        .char_indices()
        .nth(start - 1)
        .map_or(haystack.len(), |(b, _)| b);
    haystack[byte_start..]
        .find(needle)
        .map_or(0, |pos| haystack[..byte_start + pos].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn s(text: &str) -> ReportValue {
        ReportValue::string(text)
    }

    fn i(n: i64) -> ReportValue {
        ReportValue::Integer(n)
    }

    #[rstest]
    #[case(BuiltinFunction::Left, vec![s("héllo"), i(2)], s("hé"))]
    #[case(BuiltinFunction::Right, vec![s("hello"), i(3)], s("llo"))]
    #[case(BuiltinFunction::Right, vec![s("hi"), i(5)], s("hi"))]
    #[case(BuiltinFunction::Mid, vec![s("abcdef"), i(2), i(3)], s("bcd"))]
    #[case(BuiltinFunction::Mid, vec![s("abcdef"), i(4)], s("def"))]
    #[case(BuiltinFunction::Len, vec![s("héllo")], i(5))]
    #[case(BuiltinFunction::Len, vec![ReportValue::Null], i(0))]
    #[case(BuiltinFunction::Trim, vec![s("  x  ")], s("x"))]
    #[case(BuiltinFunction::UCase, vec![ReportValue::Null], ReportValue::Null)]
    #[case(BuiltinFunction::Replace, vec![s("a-b-c"), s("-"), s("+")], s("a+b+c"))]
    #[case(BuiltinFunction::InStr, vec![s("banana"), s("na")], i(3))]
    #[case(BuiltinFunction::InStr, vec![i(4), s("banana"), s("na")], i(5))]
    #[case(BuiltinFunction::InStr, vec![s("banana"), s("x")], i(0))]
    #[case(BuiltinFunction::StrReverse, vec![s("abc")], s("cba"))]
    #[case(BuiltinFunction::Space, vec![i(3)], s("   "))]
    #[case(BuiltinFunction::Format, vec![ReportValue::Double(0.25), s("P1")], s("25.0%"))]
    #[case(BuiltinFunction::Left, vec![s("abc"), i(-1)], ReportValue::Null)]
    fn test_text_functions(
        #[case] function: BuiltinFunction,
        #[case] args: Vec<ReportValue>,
        #[case] expected: ReportValue,
    ) {
        assert_eq!(call(function, &args), expected);
    }

    #[test]
    fn test_space_is_capped() {
        let longest = call(BuiltinFunction::Space, &[i(MAX_SPACE_LENGTH as i64)]);
        assert_eq!(longest.to_text().len(), MAX_SPACE_LENGTH);
        assert_eq!(
            call(BuiltinFunction::Space, &[i(MAX_SPACE_LENGTH as i64 + 1)]),
            ReportValue::Null
        );
        assert_eq!(call(BuiltinFunction::Space, &[i(1_000_000_000_000)]), ReportValue::Null);
    }
}
