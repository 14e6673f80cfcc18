//! Literal AST nodes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A literal value written directly in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// `Nothing`
    Nothing,
    /// `True` / `False`
    Boolean(bool),
    Integer(i64),
    /// Number with a fractional part, kept exact until evaluation
    Decimal(Decimal),
    /// `"text"`, with `""` already unescaped
    String(String),
    /// `#1/15/2010#`, kept as written and parsed at evaluation
    Date(String),
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }
}
