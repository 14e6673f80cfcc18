//! RDL report rendering for Rust
//!
//! This crate bundles the whole renderer:
//! - Scanning and parsing report expressions
//! - The value model and conversions
//! - Expression evaluation with builtins and aggregates
//! - Report definitions, data sets and providers
//! - Tablix layout and HTML output
//!
//! # Example
//!
//! ```ignore
//! use rdl::model::{ReportData, ReportRegistry};
//! use rdl::render::{PreparedReport, RenderRequest, ReportRenderer};
//!
//! let registry = ReportRegistry::new();
//! let report = registry.load_report_file("Sales.rdl")?;
//! let data = ReportData::from_json_file("sales.json")?;
//! let outcome = ReportRenderer::new(registry).render(
//!     &PreparedReport::prepare(report),
//!     &data,
//!     &RenderRequest::new(),
//! )?;
//! println!("{}", outcome.html());
//! ```

pub use rdl_ast as ast;
pub use rdl_diagnostics as diagnostics;
pub use rdl_eval as eval;
pub use rdl_model as model;
pub use rdl_parser as parser;
pub use rdl_render as render;
pub use rdl_types as types;

pub use rdl_diagnostics::{RdlError, Result};
pub use rdl_eval::ReportEngine;
pub use rdl_parser::parse_expression;
pub use rdl_render::{RenderOutcome, RenderRequest, ReportRenderer, ReportService};

#[cfg(feature = "cli")]
pub mod cli;
