//! Report registry
//!
//! Holds loaded report definitions (shared as `Arc<Report>`) and the shared
//! data sources reports may reference. Both maps are safe to read from
//! concurrent renders.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use log::info;
use parking_lot::RwLock;

use crate::definition::{DataSource, Report};
use crate::loader::{load_report_file, LoadError};

#[derive(Clone, Default)]
pub struct ReportRegistry {
    reports: Arc<RwLock<IndexMap<String, Arc<Report>>>>,
    data_sources: Arc<RwLock<IndexMap<String, DataSource>>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a report under its own name, replacing any previous one
    pub fn register_report(&self, report: Report) -> Arc<Report> {
        let report = Arc::new(report);
        self.reports
            .write()
            .insert(report.name.to_ascii_lowercase(), Arc::clone(&report));
        report
    }

    /// Load and register an RDL file
    pub fn load_report_file(&self, path: impl AsRef<Path>) -> Result<Arc<Report>, LoadError> {
        let report = load_report_file(path)?;
        info!("Registered report '{}'", report.name);
        Ok(self.register_report(report))
    }

    /// Load every `.rdl` file in a directory
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<Arc<Report>>, LoadError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("rdl"))
            })
            .collect();
        paths.sort();
        paths
            .into_iter()
            .map(|path| self.load_report_file(path))
            .collect()
    }

    pub fn report(&self, name: &str) -> Option<Arc<Report>> {
        self.reports.read().get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains_report(&self, name: &str) -> bool {
        self.reports.read().contains_key(&name.to_ascii_lowercase())
    }

    pub fn report_names(&self) -> Vec<String> {
        self.reports
            .read()
            .values()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Register a data source reports can reference by name
    pub fn register_data_source(&self, data_source: DataSource) {
        self.data_sources
            .write()
            .insert(data_source.name.to_ascii_lowercase(), data_source);
    }

    pub fn data_source(&self, name: &str) -> Option<DataSource> {
        self.data_sources
            .read()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Resolve a data set's data source: a report-local definition, or the
    /// shared source it references. `None` when neither exists.
    pub fn resolve_data_source(&self, report: &Report, name: &str) -> Option<DataSource> {
        match report.data_source(name) {
            Some(local) => match &local.reference {
                Some(reference) => self.data_source(reference),
                None => Some(local.clone()),
            },
            None => self.data_source(name),
        }
    }
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("reports", &self.report_names())
            .field("data_sources", &self.data_sources.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with_source(reference: Option<&str>) -> Report {
        let mut report = Report::new("Sales");
        report.data_sources.push(DataSource {
            name: "Main".to_string(),
            reference: reference.map(String::from),
            ..DataSource::default()
        });
        report
    }

    #[test]
    fn test_lookup_ignores_case() {
        let registry = ReportRegistry::new();
        registry.register_report(Report::new("Sales"));
        assert!(registry.contains_report("SALES"));
        assert_eq!(registry.report("sales").unwrap().name, "Sales");
        assert!(registry.report("Other").is_none());
    }

    #[test]
    fn test_local_data_source() {
        let registry = ReportRegistry::new();
        let report = report_with_source(None);
        assert_eq!(
            registry.resolve_data_source(&report, "main").map(|d| d.name),
            Some("Main".to_string())
        );
        assert!(registry.resolve_data_source(&report, "Other").is_none());
    }

    #[test]
    fn test_shared_reference_must_be_registered() {
        let registry = ReportRegistry::new();
        let report = report_with_source(Some("Warehouse"));
        assert!(registry.resolve_data_source(&report, "Main").is_none());

        registry.register_data_source(DataSource {
            name: "Warehouse".to_string(),
            connect_string: Some("memory".to_string()),
            ..DataSource::default()
        });
        let resolved = registry.resolve_data_source(&report, "Main").unwrap();
        assert_eq!(resolved.connect_string.as_deref(), Some("memory"));
    }
}
