//! Report file resolution
//!
//! The report named on the command line is loaded into a fresh registry
//! together with every `.rdl` file found on the search paths, so that
//! sub-reports resolve by name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use rdl_model::{Report, ReportRegistry};

/// Environment variable holding extra search paths, `:`-separated
pub const REPORT_PATH_VAR: &str = "RDL_REPORT_PATH";

pub struct ReportResolver {
    search_paths: Vec<PathBuf>,
    registry: ReportRegistry,
}

impl ReportResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        let mut paths = search_paths;
        if let Ok(env_path) = std::env::var(REPORT_PATH_VAR) {
            paths.extend(
                env_path
                    .split(':')
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            );
        }
        Self {
            search_paths: paths,
            registry: ReportRegistry::new(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    /// Load `file` after every report on the search paths; the file wins
    /// over a search-path report of the same name
    pub fn load(&self, file: &Path) -> Result<Arc<Report>> {
        for dir in &self.search_paths {
            let loaded = self
                .registry
                .load_directory(dir)
                .with_context(|| format!("Failed to load reports from {}", dir.display()))?;
            debug!("Loaded {} report(s) from {}", loaded.len(), dir.display());
        }
        self.registry
            .load_report_file(file)
            .with_context(|| format!("Failed to load report: {}", file.display()))
    }
}
