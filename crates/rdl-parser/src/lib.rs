//! RDL expression parser using Winnow
//!
//! Report expressions are scanned left to right against a fixed priority
//! catalog of recognizers (globals, aggregates, arithmetic, comparison,
//! program flow, inspection, logical, field and parameter references, the
//! remaining built-ins, groups and literals), then folded left in scan order.
//! Arithmetic has no multiplicative precedence: `=3+4*2` is `14`.
//!
//! Malformed calls do not fail the parse; they become
//! [`Expression::Unresolved`] nodes that evaluate to Nothing.

mod arguments;
mod combinators;
mod expression;
mod scanner;

pub use arguments::{find_group_end, split_arguments, ArgumentText, SplitArguments};
pub use scanner::{extract_literal, ScanCategory, Scanner, Token, TokenKind, CATALOG};

use expression::ExpressionParser;
use rdl_ast::{Expression, Spanned};
use rdl_diagnostics::Result;

/// Default bound on nested calls, parenthesised groups and prefix operators
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Expression parser
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse expression text. A leading `=` marker is optional.
    pub fn parse_expression(&self, text: &str) -> Result<Spanned<Expression>> {
        let body = strip_expression_marker(text);
        let base = text.len() - body.len();
        ExpressionParser::parse_fragment(text, body, base, 0, self.options.max_depth)
    }

    /// Scan without parsing, for diagnostics and tests
    pub fn scan(&self, text: &str) -> Vec<Token> {
        let body = strip_expression_marker(text);
        Scanner::nested(body, text.len() - body.len()).scan()
    }
}

/// Parse an expression with default options
pub fn parse_expression(text: &str) -> Result<Spanned<Expression>> {
    Parser::new().parse_expression(text)
}

/// Whether report text is an expression (`=...`) rather than literal text
pub fn is_expression(text: &str) -> bool {
    text.trim_start().starts_with('=')
}

/// Drop the leading `=` of an expression, if present
pub fn strip_expression_marker(text: &str) -> &str {
    let trimmed = text.trim_start();
    trimmed.strip_prefix('=').unwrap_or(trimmed)
}
