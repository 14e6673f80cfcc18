//! Data set provider traits
//!
//! Rendering never executes queries. A host supplies a [`DataSetProvider`]
//! that turns a data set's query (with its parameters already evaluated)
//! into fully materialised rows.

use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rdl_types::ReportValue;

use crate::data::{DataError, DataRow, ReportData};
use crate::definition::DataSource;

/// Everything a provider needs to execute one data set query
#[derive(Debug, Clone)]
pub struct DataSetRequest {
    pub report_name: String,
    pub data_set: String,
    /// The report-local or shared data source the query runs against
    pub data_source: DataSource,
    pub command_text: String,
    /// Query parameters, evaluated against the report parameters
    pub parameters: Vec<(String, ReportValue)>,
}

impl DataSetRequest {
    pub fn new(report_name: impl Into<String>, data_set: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            data_set: data_set.into(),
            data_source: DataSource::default(),
            command_text: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ReportValue> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// Trait for fetching data set rows
#[async_trait]
pub trait DataSetProvider: Send + Sync {
    async fn fetch(&self, request: &DataSetRequest) -> Result<Vec<DataRow>, ProviderError>;
}

/// Data provider error
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Data set not found: {0}")]
    DataSetNotFound(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Provider serving rows held in memory, keyed by data set name.
///
/// Rows can be registered per report (`Report/DataSet`) or for any report
/// using a data set name. Lookups ignore ASCII case.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    sets: RwLock<IndexMap<String, Vec<DataRow>>>,
    /// Serve an empty row set instead of failing for unknown data sets
    lenient: bool,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that returns no rows for unknown data sets
    pub fn lenient() -> Self {
        Self {
            sets: RwLock::new(IndexMap::new()),
            lenient: true,
        }
    }

    pub fn from_data(data: &ReportData) -> Self {
        let provider = Self::new();
        for name in data.data_set_names() {
            if let Some(rows) = data.rows(name) {
                provider.insert(name, rows.to_vec());
            }
        }
        provider
    }

    /// Load a JSON data file (`{ "DataSet": [ {...}, ... ] }`)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        Ok(Self::from_data(&ReportData::from_json_file(path)?))
    }

    pub fn insert(&self, data_set: impl Into<String>, rows: Vec<DataRow>) {
        self.sets.write().insert(data_set.into(), rows);
    }

    /// Register rows for one report's data set only
    pub fn insert_for_report(&self, report: &str, data_set: &str, rows: Vec<DataRow>) {
        self.insert(format!("{}/{}", report, data_set), rows);
    }

    fn lookup(&self, key: &str) -> Option<Vec<DataRow>> {
        let sets = self.sets.read();
        sets.get(key)
            .or_else(|| {
                sets.iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, rows)| rows)
            })
            .cloned()
    }
}

#[async_trait]
impl DataSetProvider for InMemoryProvider {
    async fn fetch(&self, request: &DataSetRequest) -> Result<Vec<DataRow>, ProviderError> {
        let scoped = format!("{}/{}", request.report_name, request.data_set);
        match self
            .lookup(&scoped)
            .or_else(|| self.lookup(&request.data_set))
        {
            Some(rows) => Ok(rows),
            None if self.lenient => Ok(Vec::new()),
            None => Err(ProviderError::DataSetNotFound(request.data_set.clone())),
        }
    }
}
