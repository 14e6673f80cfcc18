//! Per-render state
//!
//! A [`RenderScope`] bundles everything one render reads: the prepared
//! definition, the request's rows, parameters, globals, toggle set and page
//! counters. It is a bundle of shared references, copied freely down the
//! item tree; nothing in it is mutated while rendering.

use rdl_eval::{EvaluationContext, Globals, Parameters, ReportEngine};
use rdl_model::{ReportData, ReportRegistry};
use rdl_parser::is_expression;
use rdl_types::ReportValue;

use crate::error::RenderResult;
use crate::options::RenderOptions;
use crate::pagination::PageMetadata;
use crate::prepare::PreparedReport;
use crate::request::ToggleSet;

#[derive(Debug, Clone, Copy)]
pub struct RenderScope<'a> {
    pub engine: &'a ReportEngine,
    pub prepared: &'a PreparedReport,
    pub registry: &'a ReportRegistry,
    pub data: &'a ReportData,
    pub parameters: &'a Parameters,
    pub globals: &'a Globals,
    pub toggles: &'a ToggleSet,
    pub pages: &'a PageMetadata,
    pub options: &'a RenderOptions,
    /// Sub-report nesting level, 0 for the top-level report
    pub depth: usize,
}

impl<'a> RenderScope<'a> {
    /// Evaluation context over the whole report, no row selected
    pub fn context(&self) -> EvaluationContext<'a> {
        EvaluationContext::new(
            &self.prepared.report().data_sets,
            self.data,
            self.parameters,
            self.globals,
        )
    }

    /// Value of a property that is either literal text or an `=` expression
    pub fn evaluate(&self, text: &str, ctx: &EvaluationContext<'_>) -> RenderResult<ReportValue> {
        if is_expression(text) {
            Ok(self.engine.evaluate(text, ctx)?)
        } else {
            Ok(ReportValue::string(text))
        }
    }

    /// Display text of a property, formatted when `format` applies
    pub fn evaluate_text(
        &self,
        text: &str,
        ctx: &EvaluationContext<'_>,
        format: &str,
    ) -> RenderResult<String> {
        if is_expression(text) {
            Ok(self.engine.evaluate_to_string(text, ctx, format)?)
        } else {
            Ok(text.to_string())
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.toggles.contains(key)
    }
}
