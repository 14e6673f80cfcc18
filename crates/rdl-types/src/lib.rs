//! RDL value model
//!
//! This crate defines the runtime values an expression can produce:
//! - [`ReportValue`], the closed set of value variants
//! - Coercion rules shared by arithmetic, comparison and conversion functions
//! - .NET-style display formatting for dates and numbers

pub mod coercion;
pub mod format;
pub mod value;

pub use coercion::*;
pub use format::{format_datetime, format_value};
pub use value::*;
