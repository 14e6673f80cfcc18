//! Tests for malformed input and edge cases
//!
//! Covers:
//! - Wrong argument counts and unbalanced calls (unresolved, not errors)
//! - Missing operands
//! - Nesting limits
//! - Aggregate scopes and IIf
//! - Whitespace and Unicode

use pretty_assertions::assert_eq;
use rdl_ast::*;
use rdl_diagnostics::{RDL0001, RDL0002, RDL0006};
use rdl_parser::{is_expression, parse_expression, strip_expression_marker, Parser, ParserOptions};
use rstest::rstest;

fn parse_expr(input: &str) -> Expression {
    parse_expression(input)
        .unwrap_or_else(|e| panic!("Failed to parse '{}': {:?}", input, e))
        .inner
}

fn is_unresolved(expr: &Expression) -> bool {
    matches!(expr, Expression::Unresolved(_))
}

// === Unresolved calls ===

#[rstest]
#[case(r#"=Left("abc")"#)]
#[case(r#"=Left("abc", 2"#)]
#[case("=IIf(True, 1)")]
#[case("=Switch(True)")]
#[case("=Len(1 +)")]
fn test_malformed_calls_are_unresolved(#[case] input: &str) {
    assert!(is_unresolved(&parse_expr(input)), "{}", input);
}

#[test]
fn test_unresolved_call_inside_chain() {
    let expr = parse_expr(r#"="x" & Left("abc")"#);
    match expr {
        Expression::Chain(chain) => {
            assert_eq!(chain.operators().collect::<Vec<_>>(), vec![BinaryOp::Concatenate]);
            assert!(is_unresolved(&chain.rest[0].1.inner));
        }
        other => panic!("Expected Chain, got: {:?}", other),
    }
}

// === Hard errors ===

#[test]
fn test_missing_operand() {
    let err = parse_expression("=1 +").unwrap_err();
    assert_eq!(err.code(), RDL0002);
}

#[test]
fn test_dangling_operator_prefix() {
    let err = parse_expression("=* 2").unwrap_err();
    assert_eq!(err.code(), RDL0001);
}

#[test]
fn test_nesting_limit_on_groups() {
    let depth = 70;
    let input = format!("={}1{}", "(".repeat(depth), ")".repeat(depth));
    let err = parse_expression(&input).unwrap_err();
    assert_eq!(err.code(), RDL0006);
}

#[test]
fn test_nesting_limit_propagates_through_calls() {
    let depth = 70;
    let input = format!("={}1{}", "Abs(".repeat(depth), ")".repeat(depth));
    let err = parse_expression(&input).unwrap_err();
    assert_eq!(err.code(), RDL0006);
}

#[rstest]
#[case("-")]
#[case("+")]
#[case("Not ")]
fn test_nesting_limit_on_prefix_runs(#[case] prefix: &str) {
    let input = format!("={}1", prefix.repeat(3000));
    let err = parse_expression(&input).unwrap_err();
    assert_eq!(err.code(), RDL0006);
}

#[test]
fn test_prefixes_share_the_nesting_budget() {
    let parser = Parser::with_options(ParserOptions { max_depth: 2 });
    assert!(parser.parse_expression("=--1").is_ok());
    assert!(parser.parse_expression("=-(1)").is_ok());
    assert_eq!(parser.parse_expression("=---1").unwrap_err().code(), RDL0006);
    assert_eq!(parser.parse_expression("=Not -(1)").unwrap_err().code(), RDL0006);
}

#[test]
fn test_custom_nesting_limit() {
    let parser = Parser::with_options(ParserOptions { max_depth: 2 });
    assert!(parser.parse_expression("=((1))").is_ok());
    assert_eq!(
        parser.parse_expression("=(((1)))").unwrap_err().code(),
        RDL0006
    );
}

// === Calls ===

#[test]
fn test_iif_becomes_conditional() {
    let expr = parse_expr(r#"=IIf(Fields!Qty.Value > 10, "bulk", "single")"#);
    match expr {
        Expression::Conditional(c) => {
            assert!(matches!(c.condition.inner, Expression::Chain(_)));
            assert_eq!(c.then_branch.inner, Expression::Literal(Literal::string("bulk")));
            assert_eq!(c.else_branch.inner, Expression::Literal(Literal::string("single")));
        }
        other => panic!("Expected Conditional, got: {:?}", other),
    }
}

#[test]
fn test_aggregate_with_scope() {
    let expr = parse_expr(r#"=Sum(Fields!Amount.Value, "Sales")"#);
    match expr {
        Expression::Aggregate(agg) => {
            assert_eq!(agg.function, BuiltinFunction::Sum);
            assert_eq!(agg.scope.as_deref(), Some("Sales"));
            assert_eq!(
                agg.argument.map(|a| a.inner),
                Some(Expression::Field(FieldRef::value("Amount")))
            );
        }
        other => panic!("Expected Aggregate, got: {:?}", other),
    }
}

#[test]
fn test_count_rows_without_arguments() {
    let expr = parse_expr("=CountRows()");
    assert_eq!(
        expr,
        Expression::Aggregate(AggregateExpr {
            function: BuiltinFunction::CountRows,
            argument: None,
            scope: None,
        })
    );
}

#[test]
fn test_commas_inside_strings_do_not_split_arguments() {
    match parse_expr(r#"=Replace("a,b", ",", ";")"#) {
        Expression::Call(call) => {
            assert_eq!(call.function, BuiltinFunction::Replace);
            assert_eq!(call.args.len(), 3);
            assert_eq!(call.args[0].inner, Expression::Literal(Literal::string("a,b")));
        }
        other => panic!("Expected Call, got: {:?}", other),
    }
}

#[test]
fn test_argument_spans_point_into_source() {
    let source = "=Len(Fields!Name.Value)";
    let parsed = parse_expression(source).unwrap();
    let Expression::Call(call) = parsed.inner else {
        panic!("Expected Call");
    };
    assert_eq!(call.args[0].span.slice(source), Some("Fields!Name.Value"));
}

// === Whitespace and text ===

#[rstest]
#[case("  = 1 + 2  ")]
#[case("=1+2")]
#[case("=\t1\n+\n2")]
fn test_whitespace_is_insignificant(#[case] input: &str) {
    assert!(matches!(parse_expr(input), Expression::Chain(_)));
}

#[test]
fn test_unicode_string() {
    assert_eq!(
        parse_expr("=\"Grüße ✓\""),
        Expression::Literal(Literal::string("Grüße ✓"))
    );
}

#[test]
fn test_expression_marker() {
    assert!(is_expression("=1"));
    assert!(is_expression("  =Fields!A.Value"));
    assert!(!is_expression("Plain text"));
    assert_eq!(strip_expression_marker(" =1 + 2"), "1 + 2");
}
