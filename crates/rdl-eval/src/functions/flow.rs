//! Program Flow Functions
//!
//! Implements: Switch, Choose
//!
//! `IIf` parses to a conditional node and is reduced by the visitor. As in
//! VB, every argument has already been evaluated by the time a flow
//! function picks one.

use rdl_ast::BuiltinFunction;
use rdl_types::{is_truthy, ReportValue};

use super::int_arg;

pub fn call(function: BuiltinFunction, args: &[ReportValue]) -> ReportValue {
    match function {
        BuiltinFunction::Switch => switch(args),
        BuiltinFunction::Choose => choose(args),
        _ => ReportValue::Null,
    }
}

/// Value paired with the first true condition
fn switch(args: &[ReportValue]) -> ReportValue {
    args.chunks_exact(2)
        .find(|pair| is_truthy(&pair[0]))
        .map(|pair| pair[1].clone())
        .unwrap_or(ReportValue::Null)
}

/// `Choose(index, v1, v2, ...)` with a 1-based index
fn choose(args: &[ReportValue]) -> ReportValue {
    int_arg(args, 0)
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i >= 1)
        .and_then(|i| args.get(i))
        .cloned()
        .unwrap_or(ReportValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> ReportValue {
        ReportValue::string(text)
    }

    #[test]
    fn test_switch_picks_first_true() {
        let args = [
            ReportValue::Boolean(false),
            s("a"),
            ReportValue::Boolean(true),
            s("b"),
            ReportValue::Boolean(true),
            s("c"),
        ];
        assert_eq!(call(BuiltinFunction::Switch, &args), s("b"));
        assert_eq!(
            call(BuiltinFunction::Switch, &[ReportValue::Boolean(false), s("a")]),
            ReportValue::Null
        );
    }

    #[test]
    fn test_choose() {
        let args = [ReportValue::Integer(2), s("a"), s("b"), s("c")];
        assert_eq!(call(BuiltinFunction::Choose, &args), s("b"));
        let out_of_range = [ReportValue::Integer(4), s("a")];
        assert_eq!(call(BuiltinFunction::Choose, &out_of_range), ReportValue::Null);
        let zero = [ReportValue::Integer(0), s("a")];
        assert_eq!(call(BuiltinFunction::Choose, &zero), ReportValue::Null);
    }
}
