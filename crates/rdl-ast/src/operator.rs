//! Expression operators
//!
//! Report expressions are reduced in scan order: arithmetic and comparison
//! operators share one left fold, logical operators fold the results of
//! those chains. There is no multiplicative-over-additive precedence.

use serde::{Deserialize, Serialize};

/// Scanner category an operator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorCategory {
    Arithmetic,
    Comparison,
    Logical,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    /// String concatenation (`&`)
    Concatenate,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    /// Wildcard pattern match (`"Abc" Like "A*"`)
    Like,
    /// Identity test, mostly `X Is Nothing`
    Is,

    // Logical
    And,
    /// Same truth table as `And`; both sides are still evaluated
    AndAlso,
    Or,
    /// Same truth table as `Or`; both sides are still evaluated
    OrElse,
    Xor,
}

impl BinaryOp {
    pub const fn category(&self) -> OperatorCategory {
        match self {
            Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide
            | Self::Concatenate
            | Self::Modulo
            | Self::Power => OperatorCategory::Arithmetic,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessOrEqual
            | Self::Greater
            | Self::GreaterOrEqual
            | Self::Like
            | Self::Is => OperatorCategory::Comparison,
            Self::And | Self::AndAlso | Self::Or | Self::OrElse | Self::Xor => {
                OperatorCategory::Logical
            }
        }
    }

    pub const fn is_arithmetic(&self) -> bool {
        matches!(self.category(), OperatorCategory::Arithmetic)
    }

    pub const fn is_comparison(&self) -> bool {
        matches!(self.category(), OperatorCategory::Comparison)
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self.category(), OperatorCategory::Logical)
    }

    /// Get the operator symbol as written in report expressions
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Concatenate => "&",
            Self::Modulo => "Mod",
            Self::Power => "^",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Like => "Like",
            Self::Is => "Is",
            Self::And => "And",
            Self::AndAlso => "AndAlso",
            Self::Or => "Or",
            Self::OrElse => "OrElse",
            Self::Xor => "Xor",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Plus,
    Negate,
}

impl UnaryOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "Not",
            Self::Plus => "+",
            Self::Negate => "-",
        }
    }
}
