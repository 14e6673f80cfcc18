//! Report rendering
//!
//! [`ReportRenderer`] is the synchronous core: given a prepared definition,
//! the rows fetched for this request and the request itself, it resolves
//! parameters, checks the report's wiring, and renders the body. Data
//! acquisition happens before it runs (see [`crate::service`]).

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

use log::{debug, info, warn};
use rdl_eval::{EvalError, EvaluationContext, Globals, ReportEngine};
use rdl_model::{ItemKind, Report, ReportData, ReportRegistry, Subreport};

use crate::error::{RenderError, RenderResult};
use crate::html::{escape_attr, escape_text, pt};
use crate::options::RenderOptions;
use crate::pagination::PageMetadata;
use crate::parameters::{render_parameter_form, resolve_parameters, ResolvedParameters};
use crate::prepare::PreparedReport;
use crate::request::{ParameterInput, ParameterRequest, RenderRequest, RenderResponse};
use crate::scope::RenderScope;

/// Result of a render request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderResponse),
    /// Some parameter still needs a value; carries the form without a run
    /// button
    IncompleteParameters { form: String },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    pub fn html(&self) -> &str {
        match self {
            Self::Rendered(response) => &response.html,
            Self::IncompleteParameters { form } => form,
        }
    }

    pub fn into_response(self) -> Option<RenderResponse> {
        match self {
            Self::Rendered(response) => Some(response),
            Self::IncompleteParameters { .. } => None,
        }
    }
}

/// The parameter form and whether it offers a run button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterForm {
    pub html: String,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct ReportRenderer {
    engine: Arc<ReportEngine>,
    options: RenderOptions,
    registry: ReportRegistry,
}

impl ReportRenderer {
    pub fn new(registry: ReportRegistry) -> Self {
        Self {
            engine: Arc::new(ReportEngine::new()),
            options: RenderOptions::default(),
            registry,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an engine (and its parse cache) with other renderers
    pub fn with_engine(mut self, engine: Arc<ReportEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &ReportEngine {
        &self.engine
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    pub fn globals(&self, report: &Report) -> Globals {
        self.options.globals(&report.name, report.language.as_deref())
    }

    pub fn resolve_parameters(
        &self,
        report: &Report,
        data: &ReportData,
        inputs: &[ParameterInput],
    ) -> RenderResult<ResolvedParameters> {
        resolve_parameters(&self.engine, report, data, &self.globals(report), inputs)
    }

    /// Parameter collection: the form for the values supplied so far
    pub fn parameter_form(
        &self,
        report: &Report,
        data: &ReportData,
        request: &ParameterRequest,
    ) -> RenderResult<ParameterForm> {
        let resolved = self.resolve_parameters(report, data, &request.parameters)?;
        Ok(ParameterForm {
            html: render_parameter_form(report, &resolved),
            complete: resolved.is_complete(),
        })
    }

    /// Fail on data sets whose data source nobody registered and on
    /// sub-reports naming unknown reports, following sub-reports down
    pub fn validate(&self, report: &Report) -> RenderResult<()> {
        let mut visited = HashSet::new();
        self.validate_report(report, &mut visited)
    }

    fn validate_report(&self, report: &Report, visited: &mut HashSet<String>) -> RenderResult<()> {
        if !visited.insert(report.name.to_ascii_lowercase()) {
            return Ok(());
        }

        for data_set in &report.data_sets {
            let source = data_set.query.data_source_name.as_str();
            if source.is_empty() {
                continue;
            }
            if self.registry.resolve_data_source(report, source).is_none() {
                warn!(
                    "Report '{}': data set '{}' uses unregistered data source '{}'",
                    report.name, data_set.name, source
                );
                return Err(RenderError::unregistered_data_source(&data_set.name, source));
            }
        }

        for item in report.all_items() {
            let ItemKind::Subreport(subreport) = &item.kind else {
                continue;
            };
            let Some(child) = self.registry.report(&subreport.report_name) else {
                warn!(
                    "Report '{}': sub-report '{}' names unregistered report '{}'",
                    report.name, item.name, subreport.report_name
                );
                return Err(RenderError::unregistered_subreport(&item.name, &subreport.report_name));
            };
            self.validate_report(&child, visited)?;
        }
        Ok(())
    }

    /// Render one request against already-fetched data
    pub fn render(
        &self,
        prepared: &PreparedReport,
        data: &ReportData,
        request: &RenderRequest,
    ) -> RenderResult<RenderOutcome> {
        let report = prepared.report();

        let mut pages = PageMetadata::from_entries(request.metadata.clone());
        if let Some(navigate) = &request.navigate {
            let page = pages.navigate(navigate);
            debug!("Tablix '{}' moved to page {}", navigate.table, page);
        }

        let resolved = self.resolve_parameters(report, data, &request.parameters)?;
        if !resolved.is_complete() {
            info!(
                "Report '{}' waiting for parameters: {}",
                report.name,
                resolved.unsatisfied().collect::<Vec<_>>().join(", ")
            );
            return Ok(RenderOutcome::IncompleteParameters {
                form: render_parameter_form(report, &resolved),
            });
        }

        self.validate(report)?;

        let globals = self.globals(report);
        let toggles = request.toggles();
        let scope = RenderScope {
            engine: &self.engine,
            prepared,
            registry: &self.registry,
            data,
            parameters: &resolved.values,
            globals: &globals,
            toggles: &toggles,
            pages: &pages,
            options: &self.options,
            depth: 0,
        };
        let html = scope.render_body()?;
        info!("Rendered report '{}' ({} bytes)", report.name, html.len());

        Ok(RenderOutcome::Rendered(RenderResponse {
            html,
            metadata: pages.into_entries(),
        }))
    }
}

impl RenderScope<'_> {
    /// The report body: items at their offsets inside a positioned page
    pub fn render_body(&self) -> RenderResult<String> {
        let report = self.prepared.report();
        let inner = self.render_items(&report.body.items, &self.context(), None)?;
        let mut style = String::from("position:relative;");
        if report.width > 0.0 {
            let _ = write!(style, "width:{};", pt(report.width));
        }
        if report.body.height > 0.0 {
            let _ = write!(style, "min-height:{};", pt(report.body.height));
        }
        Ok(format!(
            "<div class=\"rdl-report\" data-report=\"{}\"><div class=\"rdl-body\" style=\"{}\">{}</div></div>",
            escape_attr(&report.name),
            style,
            inner
        ))
    }

    /// Render a registered report in place, with rows the parent fetched for
    /// it and parameters evaluated in the parent's context
    pub fn render_subreport(
        &self,
        name: &str,
        subreport: &Subreport,
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<String> {
        if self.depth >= self.options.max_subreport_depth {
            return Err(EvalError::RecursionLimit.into());
        }
        let Some(report) = self.registry.report(&subreport.report_name) else {
            return Err(RenderError::unregistered_subreport(name, &subreport.report_name));
        };

        let mut inputs = Vec::with_capacity(subreport.parameters.len());
        for parameter in &subreport.parameters {
            let value = self.evaluate(&parameter.value, ctx)?;
            inputs.push(ParameterInput::single(&parameter.name, value.to_text()));
        }

        let data = subreport_data(self.data, &report);
        let globals = Globals {
            report_name: report.name.clone(),
            ..self.globals.clone()
        };
        let resolved = resolve_parameters(self.engine, &report, &data, &globals, &inputs)?;
        if !resolved.is_complete() {
            debug!(
                "Sub-report '{}' renders with unsatisfied parameters: {}",
                name,
                resolved.unsatisfied().collect::<Vec<_>>().join(", ")
            );
        }

        let empty = !report.data_sets.is_empty()
            && report
                .data_sets
                .iter()
                .all(|ds| data.rows(&ds.name).is_none_or(<[_]>::is_empty));
        if empty {
            if let Some(message) = &subreport.no_rows_message {
                let text = self.evaluate_text(message, ctx, "")?;
                return Ok(format!("<div class=\"rdl-norows\">{}</div>", escape_text(&text)));
            }
        }

        let prepared = PreparedReport::prepare(report);
        let scope = RenderScope {
            prepared: &prepared,
            data: &data,
            parameters: &resolved.values,
            globals: &globals,
            depth: self.depth + 1,
            ..*self
        };
        scope.render_body()
    }
}

/// Rows for a sub-report's data sets: `Report/DataSet` entries first, then
/// bare data set names
fn subreport_data(parent: &ReportData, report: &Report) -> ReportData {
    let mut data = ReportData::new();
    for data_set in &report.data_sets {
        let scoped = format!("{}/{}", report.name, data_set.name);
        if let Some(rows) = parent.rows(&scoped).or_else(|| parent.rows(&data_set.name)) {
            data.insert(data_set.name.clone(), rows.to_vec());
        }
    }
    data
}
