//! RDL Report Rendering
//!
//! Turns a report definition plus fetched rows into HTML.
//!
//! - **Preparation**: [`PreparedReport`] indexes each Tablix hierarchy once
//!   per definition and is shared by every render of it
//! - **Tablix**: grouping, chained sorting, repeating detail rows, row and
//!   column headers, page windows
//! - **Items**: textboxes, rectangles, images, lines and sub-reports,
//!   placed in spatial order
//! - **Interactivity**: visibility toggles keyed by group instance, page
//!   counters carried in request metadata, the parameter form
//! - **Service**: [`ReportService`] fetches data sets through a
//!   [`DataSetProvider`](rdl_model::DataSetProvider) and renders
//!
//! # Example
//!
//! ```ignore
//! use rdl_model::{ReportData, ReportRegistry};
//! use rdl_render::{PreparedReport, RenderRequest, ReportRenderer};
//!
//! let registry = ReportRegistry::new();
//! let report = registry.load_report_file("Sales.rdl")?;
//! let prepared = PreparedReport::prepare(report);
//! let data = ReportData::from_json_file("sales.json")?;
//!
//! let outcome = ReportRenderer::new(registry).render(&prepared, &data, &RenderRequest::new())?;
//! println!("{}", outcome.html());
//! ```
//!
//! Every render reads only the prepared definition, the rows handed to it
//! and the request; concurrent renders of one report share nothing mutable
//! beyond the engine's parse cache.

pub mod comparator;
pub mod error;
pub mod html;
pub mod items;
pub mod options;
pub mod pagination;
pub mod parameters;
pub mod prepare;
pub mod report;
pub mod request;
pub mod scope;
pub mod service;
pub mod tablix;
pub mod visibility;

pub use comparator::{SortKey, SortKeyComparator, compare_field, sort_by_keys, spatial_order};
pub use error::{RenderError, RenderResult};
pub use items::Placement;
pub use options::RenderOptions;
pub use pagination::{MetadataEntry, PageMetadata, TABLIX_PAGE_KEY, page_window};
pub use parameters::{
    ParameterSource, ParameterState, ResolvedParameters, render_parameter_form, resolve_parameters,
};
pub use prepare::{PreparedReport, PreparedTablix};
pub use report::{ParameterForm, RenderOutcome, ReportRenderer};
pub use request::{
    Direction, Navigate, ParameterInput, ParameterRequest, RenderRequest, RenderResponse, ToggleSet,
};
pub use scope::RenderScope;
pub use service::ReportService;
pub use tablix::{ColumnLayout, ColumnSlot, GroupInstance};
pub use visibility::instance_key;
