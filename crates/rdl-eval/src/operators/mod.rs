//! Operator Implementations
//!
//! Bare operators folded by the expression visitor:
//! - Arithmetic operators (`+ - * / & Mod ^`, unary `-`)
//! - Comparison operators (`= <> < <= > >= Like Is`) and the sort comparator
//! - Logical operators (`And AndAlso Or OrElse Xor Not`)

pub mod arithmetic;
pub mod comparison;
pub mod logical;

pub use comparison::{compare_values, like_pattern, sort_compare};
