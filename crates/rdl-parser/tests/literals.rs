//! Tests for parsing literal values
//!
//! Covers:
//! - Integers and decimals
//! - Double-quoted strings with `""` escapes
//! - True / False / Nothing
//! - `#date#` literals
//! - Literal extraction from unrecognised text

use rdl_ast::{Expression, Literal, UnaryOp};
use rdl_parser::parse_expression;
use rstest::rstest;
use rust_decimal::Decimal;

fn parse_expr(input: &str) -> Expression {
    parse_expression(input)
        .unwrap_or_else(|e| panic!("Failed to parse '{}': {:?}", input, e))
        .inner
}

fn assert_literal(expr: &Expression) -> &Literal {
    match expr {
        Expression::Literal(lit) => lit,
        _ => panic!("Expected Literal, got: {:?}", expr),
    }
}

#[test]
fn test_integer_positive() {
    let expr = parse_expr("=42");
    assert!(matches!(assert_literal(&expr), Literal::Integer(42)));
}

#[test]
fn test_integer_negative() {
    let expr = parse_expr("=-42");
    // unary minus over the literal
    match &expr {
        Expression::UnaryOp(unary) => {
            assert_eq!(unary.op, UnaryOp::Negate);
            assert!(matches!(
                assert_literal(&unary.operand.inner),
                Literal::Integer(42)
            ));
        }
        _ => panic!("Expected UnaryOp, got: {:?}", expr),
    }
}

#[test]
fn test_decimal() {
    let expr = parse_expr("=3.25");
    assert_eq!(
        assert_literal(&expr),
        &Literal::Decimal(Decimal::new(325, 2))
    );
}

#[rstest]
#[case(r#"="hello""#, "hello")]
#[case(r#"="""quoted""""#, "\"quoted\"")]
#[case(r#"="a = b""#, "a = b")]
#[case(r#"="""#, "")]
fn test_string_literals(#[case] input: &str, #[case] expected: &str) {
    let expr = parse_expr(input);
    assert_eq!(assert_literal(&expr), &Literal::string(expected));
}

#[rstest]
#[case("=True", Literal::Boolean(true))]
#[case("=false", Literal::Boolean(false))]
#[case("=Nothing", Literal::Nothing)]
fn test_keyword_literals(#[case] input: &str, #[case] expected: Literal) {
    assert_eq!(assert_literal(&parse_expr(input)), &expected);
}

#[test]
fn test_date_literal() {
    let expr = parse_expr("=#1/15/2010#");
    assert_eq!(assert_literal(&expr), &Literal::Date("1/15/2010".to_string()));
}

// === Literal extraction ===

#[test]
fn test_plain_text_becomes_text_node() {
    assert_eq!(parse_expr("=Hello World"), Expression::Text("Hello World".to_string()));
}

#[test]
fn test_text_with_integer_token() {
    // the first integer token of unrecognised text wins
    assert_eq!(
        parse_expr("=Chapter 7"),
        Expression::Literal(Literal::Integer(7))
    );
}

#[test]
fn test_unterminated_string_keeps_text() {
    assert_eq!(parse_expr("=\"open"), Expression::Text("open".to_string()));
}
