//! Evaluation context for report expressions
//!
//! An [`EvaluationContext`] is a small `Copy` value describing where an
//! expression is being evaluated: which dataset is active, which row is
//! current, which rows form the enclosing group, plus the request's
//! parameters and globals. Renderers derive narrower contexts from wider
//! ones (`with_scope`, `with_row`) instead of mutating shared state, so a
//! context never outlives the rows it points at.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rdl_model::{DataRow, DataSet, ReportData};
use rdl_types::ReportValue;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// Bound on nested calculated-field and sub-report evaluation
pub const MAX_EVALUATION_DEPTH: usize = 64;

/// The value(s) and label(s) of one report parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub values: Vec<ReportValue>,
    /// Display labels, parallel to `values` when known
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ParameterValue {
    pub fn single(value: impl Into<ReportValue>) -> Self {
        Self {
            values: vec![value.into()],
            labels: Vec::new(),
        }
    }

    pub fn multi(values: impl IntoIterator<Item = ReportValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(ReportValue::is_null)
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// `Parameters!X.Value`: the single value, or the values joined with
    /// `", "` for a multi-value parameter
    pub fn value(&self) -> ReportValue {
        match self.values.as_slice() {
            [] => ReportValue::Null,
            [single] => single.clone(),
            many => ReportValue::String(
                many.iter()
                    .map(ReportValue::to_text)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }

    /// `Parameters!X.Label`, falling back to the value's text
    pub fn label(&self) -> ReportValue {
        let labels: Vec<String> = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| self.labels.get(i).cloned().unwrap_or_else(|| v.to_text()))
            .collect();
        match labels.len() {
            0 => ReportValue::Null,
            _ => ReportValue::String(labels.join(", ")),
        }
    }
}

/// Resolved report parameters, looked up case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    values: IndexMap<String, ParameterValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        let name = name.into();
        match self
            .values
            .keys()
            .position(|k| k.eq_ignore_ascii_case(&name))
        {
            Some(i) => {
                if let Some((_, slot)) = self.values.get_index_mut(i) {
                    *slot = value;
                }
            }
            None => {
                self.values.insert(name, value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name).or_else(|| {
            self.values
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Values behind `Globals!X` and `User!X`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    pub execution_time: NaiveDateTime,
    pub report_name: String,
    pub page_number: usize,
    pub total_pages: usize,
    pub language: String,
    pub user_id: String,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            execution_time: chrono::Local::now().naive_local(),
            report_name: String::new(),
            page_number: 1,
            total_pages: 1,
            language: "en-US".to_string(),
            user_id: String::new(),
        }
    }
}

impl Globals {
    pub fn for_report(report_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            ..Self::default()
        }
    }
}

/// Owned inputs a context borrows from.
///
/// Convenient for hosts and tests that evaluate free-standing expressions;
/// the report renderer builds contexts over its own prepared state.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEnvironment {
    pub datasets: Vec<DataSet>,
    pub data: ReportData,
    pub parameters: Parameters,
    pub globals: Globals,
}

impl EvaluationEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: DataSet, rows: Vec<DataRow>) -> Self {
        self.data.insert(dataset.name.clone(), rows);
        self.datasets.push(dataset);
        self
    }

    pub fn with_data(mut self, data: ReportData) -> Self {
        self.data = data;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    pub fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(&self.datasets, &self.data, &self.parameters, &self.globals)
    }
}

/// Where an expression is being evaluated
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Dataset definitions of the report (for calculated fields)
    pub datasets: &'a [DataSet],
    /// Rows fetched for this request
    pub data: &'a ReportData,
    pub parameters: &'a Parameters,
    pub globals: &'a Globals,
    /// Dataset the enclosing data region is bound to
    pub active_dataset: Option<&'a str>,
    pub current_row: Option<&'a DataRow>,
    /// 1-based; zero outside any row iteration
    pub row_number: usize,
    /// Rows of the enclosing group instance
    pub scope_rows: Option<&'a [&'a DataRow]>,
    /// Dataset named by the enclosing aggregate's scope argument
    pub aggregate_scope: Option<&'a str>,
    depth: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        datasets: &'a [DataSet],
        data: &'a ReportData,
        parameters: &'a Parameters,
        globals: &'a Globals,
    ) -> Self {
        Self {
            datasets,
            data,
            parameters,
            globals,
            active_dataset: None,
            current_row: None,
            row_number: 0,
            scope_rows: None,
            aggregate_scope: None,
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// One level deeper, failing past [`MAX_EVALUATION_DEPTH`]
    pub fn enter(self) -> EvalResult<Self> {
        if self.depth >= MAX_EVALUATION_DEPTH {
            return Err(EvalError::RecursionLimit);
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }

    pub fn with_dataset<'b>(self, dataset: &'b str) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        let mut ctx: EvaluationContext<'b> = self;
        ctx.active_dataset = Some(dataset);
        ctx
    }

    /// Narrow to a group instance; the current row moves to its first row
    pub fn with_scope<'b>(self, rows: &'b [&'b DataRow]) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        let mut ctx: EvaluationContext<'b> = self;
        ctx.scope_rows = Some(rows);
        ctx.current_row = rows.first().copied();
        ctx.row_number = usize::from(!rows.is_empty());
        ctx
    }

    pub fn with_row<'b>(self, row: &'b DataRow, row_number: usize) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        let mut ctx: EvaluationContext<'b> = self;
        ctx.current_row = Some(row);
        ctx.row_number = row_number;
        ctx
    }

    /// Same context with different globals (a Tablix's own page number)
    pub fn with_globals<'b>(self, globals: &'b Globals) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        let mut ctx: EvaluationContext<'b> = self;
        ctx.globals = globals;
        ctx
    }

    pub fn with_aggregate_scope<'b>(self, dataset: &'b str) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        let mut ctx: EvaluationContext<'b> = self;
        ctx.aggregate_scope = Some(dataset);
        ctx
    }

    /// Dataset definition by name, ignoring case
    pub fn dataset(&self, name: &str) -> Option<&'a DataSet> {
        self.datasets
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn active_definition(&self) -> Option<&'a DataSet> {
        self.active_dataset.and_then(|name| self.dataset(name))
    }

    /// Rows of the active dataset, or of the only dataset when none is active
    pub fn active_rows(&self) -> Option<&'a [DataRow]> {
        match self.active_dataset {
            Some(name) => self.data.rows(name),
            None => self.data.only().map(|(_, rows)| rows),
        }
    }
}
