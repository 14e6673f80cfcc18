//! Asynchronous report service
//!
//! [`ReportService`] is the host-facing entry point. It owns the registry
//! and a [`DataSetProvider`], fetches every data set a render needs
//! (concurrently, once parameters are known), then hands the rows to the
//! synchronous [`ReportRenderer`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info};
use parking_lot::RwLock;
use rdl_eval::{EvaluationContext, Parameters};
use rdl_model::{
    DataRow, DataSetProvider, DataSetRequest, DataSource, ItemKind, Report, ReportData, ReportRegistry,
};
use rdl_parser::is_expression;
use rdl_types::ReportValue;

use crate::error::{RenderError, RenderResult};
use crate::options::RenderOptions;
use crate::prepare::PreparedReport;
use crate::report::{ParameterForm, RenderOutcome, ReportRenderer};
use crate::request::{ParameterRequest, RenderRequest};

pub struct ReportService {
    renderer: ReportRenderer,
    provider: Arc<dyn DataSetProvider>,
    prepared: RwLock<HashMap<String, Arc<PreparedReport>>>,
}

impl ReportService {
    pub fn new(registry: ReportRegistry, provider: Arc<dyn DataSetProvider>) -> Self {
        Self {
            renderer: ReportRenderer::new(registry),
            provider,
            prepared: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.renderer = self.renderer.with_options(options);
        self
    }

    pub fn registry(&self) -> &ReportRegistry {
        self.renderer.registry()
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Prepared form of a registered report, rebuilt when the registry
    /// holds a newer definition than the cached one
    pub fn prepared(&self, report_name: &str) -> RenderResult<Arc<PreparedReport>> {
        let report = self
            .registry()
            .report(report_name)
            .ok_or_else(|| RenderError::unknown_report(report_name))?;
        let key = report_name.to_ascii_lowercase();

        if let Some(cached) = self.prepared.read().get(&key) {
            if Arc::ptr_eq(&cached.shared_report(), &report) {
                return Ok(Arc::clone(cached));
            }
        }

        debug!("Preparing report '{}'", report.name);
        let prepared = PreparedReport::prepare(report);
        self.prepared.write().insert(key, Arc::clone(&prepared));
        Ok(prepared)
    }

    /// Parameter collection for a registered report
    pub async fn parameters(&self, report_name: &str, request: &ParameterRequest) -> RenderResult<ParameterForm> {
        let prepared = self.prepared(report_name)?;
        self.renderer
            .parameter_form(prepared.report(), &ReportData::new(), request)
    }

    pub async fn render(&self, report_name: &str, request: &RenderRequest) -> RenderResult<RenderOutcome> {
        let prepared = self.prepared(report_name)?;
        let report = prepared.report();
        info!("Rendering report '{}'", report.name);

        let resolved = self
            .renderer
            .resolve_parameters(report, &ReportData::new(), &request.parameters)?;
        if !resolved.is_complete() {
            return self.renderer.render(&prepared, &ReportData::new(), request);
        }
        self.renderer.validate(report)?;

        let mut data = ReportData::new();
        for (data_set, rows) in self.fetch_report(report, &resolved.values).await? {
            data.insert(data_set, rows);
        }
        self.fetch_subreports(report, &mut data).await?;

        self.renderer.render(&prepared, &data, request)
    }

    /// Fetch every data set of `report` concurrently
    pub async fn fetch_report(
        &self,
        report: &Report,
        parameters: &Parameters,
    ) -> RenderResult<Vec<(String, Vec<DataRow>)>> {
        let requests = self.data_set_requests(report, parameters)?;
        let fetches = requests.iter().map(|request| async move {
            self.provider
                .fetch(request)
                .await
                .map(|rows| (request.data_set.clone(), rows))
                .map_err(|source| RenderError::Provider {
                    data_set: request.data_set.clone(),
                    source,
                })
        });
        let fetched = try_join_all(fetches).await?;
        info!(
            "Report '{}': fetched {} data set(s), {} row(s)",
            report.name,
            fetched.len(),
            fetched.iter().map(|(_, rows)| rows.len()).sum::<usize>()
        );
        Ok(fetched)
    }

    /// One provider request per data set, query parameters evaluated
    pub fn data_set_requests(&self, report: &Report, parameters: &Parameters) -> RenderResult<Vec<DataSetRequest>> {
        let globals = self.renderer.globals(report);
        let no_rows = ReportData::new();
        let ctx = EvaluationContext::new(&report.data_sets, &no_rows, parameters, &globals);

        let mut requests = Vec::with_capacity(report.data_sets.len());
        for data_set in &report.data_sets {
            let source_name = data_set.query.data_source_name.as_str();
            let data_source = if source_name.is_empty() {
                DataSource::default()
            } else {
                self.registry()
                    .resolve_data_source(report, source_name)
                    .ok_or_else(|| RenderError::unregistered_data_source(&data_set.name, source_name))?
            };

            let mut query_parameters = Vec::with_capacity(data_set.query.parameters.len());
            for parameter in &data_set.query.parameters {
                let value = if is_expression(&parameter.value) {
                    self.renderer.engine().evaluate(&parameter.value, &ctx)?
                } else {
                    ReportValue::string(&parameter.value)
                };
                query_parameters.push((parameter.name.clone(), value));
            }

            requests.push(DataSetRequest {
                report_name: report.name.clone(),
                data_set: data_set.name.clone(),
                data_source,
                command_text: data_set.query.command_text.clone(),
                parameters: query_parameters,
            });
        }
        Ok(requests)
    }

    /// Rows for every reachable sub-report, stored as `Report/DataSet`.
    /// Query parameters use each sub-report's default parameter values.
    async fn fetch_subreports(&self, report: &Report, data: &mut ReportData) -> RenderResult<()> {
        let mut visited: HashSet<String> = HashSet::from([report.name.to_ascii_lowercase()]);
        let mut pending: VecDeque<(Arc<Report>, usize)> = subreports(self.registry(), report)
            .into_iter()
            .map(|child| (child, 1))
            .collect();

        while let Some((child, depth)) = pending.pop_front() {
            if depth > self.renderer.options().max_subreport_depth
                || !visited.insert(child.name.to_ascii_lowercase())
            {
                continue;
            }
            let defaults = self.renderer.resolve_parameters(&child, &ReportData::new(), &[])?;
            for (data_set, rows) in self.fetch_report(&child, &defaults.values).await? {
                data.insert(format!("{}/{}", child.name, data_set), rows);
            }
            pending.extend(
                subreports(self.registry(), &child)
                    .into_iter()
                    .map(|grandchild| (grandchild, depth + 1)),
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("renderer", &self.renderer)
            .field("prepared", &self.prepared.read().len())
            .finish()
    }
}

/// Registered reports named by the report's sub-report items
fn subreports(registry: &ReportRegistry, report: &Report) -> Vec<Arc<Report>> {
    report
        .all_items()
        .into_iter()
        .filter_map(|item| match &item.kind {
            ItemKind::Subreport(subreport) => registry.report(&subreport.report_name),
            _ => None,
        })
        .collect()
}
