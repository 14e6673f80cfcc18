//! RDL Expression Evaluation
//!
//! Evaluates report expressions against dataset rows, parameters and
//! globals. The engine parses each expression once, caches the tree, and
//! walks it with an [`EvaluationContext`] describing the current row and
//! group scope.
//!
//! - **Operators**: arithmetic, concatenation, comparison, `Like`, logical
//! - **Functions**: program flow, inspection, date/time, text, math,
//!   conversion
//! - **Aggregates**: Count, Sum, Avg, Min, Max, First, Last, CountDistinct,
//!   CountRows, RowNumber over a dataset or group scope
//! - **References**: `Fields!`, `Parameters!`, `Globals!`, calculated fields
//!
//! # Example
//!
//! ```ignore
//! use rdl_eval::{EvaluationEnvironment, ReportEngine};
//!
//! let engine = ReportEngine::new();
//! let env = EvaluationEnvironment::new();
//! let value = engine.evaluate("=3+4*2", &env.context()).unwrap();
//! assert_eq!(value.to_text(), "14"); // scan order, not precedence
//! ```
//!
//! # Failure Model
//!
//! Evaluation is forgiving: an expression that cannot be parsed, a call with
//! the wrong number of arguments, or an operator applied to incompatible
//! values produces Nothing. Only explicit conversions (`CInt("abc")`) and
//! runaway recursion surface as [`EvalError`].

pub mod context;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod resolver;

pub use context::{
    EvaluationContext, EvaluationEnvironment, Globals, MAX_EVALUATION_DEPTH, ParameterValue,
    Parameters,
};
pub use engine::{
    Arguments, ReportEngine, render_value, MAX_CACHED_EXPRESSIONS, MAX_CACHED_PATTERNS,
};
pub use error::{EvalError, EvalResult};
pub use functions::aggregate::AggregateScope;
pub use operators::{compare_values, like_pattern, sort_compare};
