//! Report definition model
//!
//! This crate provides:
//! - The report definition tree (data sources, data sets, parameters, items, Tablix)
//! - Request-scoped data rows
//! - The RDL XML loader
//! - Member hierarchy indexing
//! - Data set provider traits
//! - A registry of reports and shared data sources

pub mod data;
pub mod definition;
pub mod hierarchy;
pub mod loader;
pub mod provider;
pub mod registry;
pub mod units;

pub use data::*;
pub use definition::*;
pub use hierarchy::*;
pub use loader::{load_report, load_report_file, LoadError};
pub use provider::*;
pub use registry::*;
pub use units::parse_size;
