//! RDL expression AST
//!
//! This crate defines the tagged tree produced by scanning a report
//! expression (`=Sum(Fields!Amount.Value) & " total"`), the operator
//! enums, and the catalog of built-in functions with their categories and
//! arities.

mod expression;
mod function;
mod literal;
mod operator;

pub use expression::*;
pub use function::*;
pub use literal::*;
pub use operator::*;

/// A node with source span information
pub type Spanned<T> = rdl_diagnostics::Spanned<T>;

/// Type alias for boxed expressions
pub type BoxExpr = Box<Spanned<Expression>>;
