//! Render configuration

use chrono::{Local, NaiveDateTime};
use rdl_eval::{Globals, MAX_EVALUATION_DEPTH};
use serde::{Deserialize, Serialize};

/// Options that apply to every render of a renderer or service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// `User!Language` when the report declares none
    pub language: String,
    /// Fixed `Globals!ExecutionTime`; the wall clock when unset
    pub execution_time: Option<NaiveDateTime>,
    /// Rows per page for paged Tablixes; unset renders every row
    pub page_size: Option<usize>,
    /// Nesting bound for sub-reports rendering sub-reports
    pub max_subreport_depth: usize,
    /// `User!UserID`
    pub user_id: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            execution_time: None,
            page_size: None,
            max_subreport_depth: MAX_EVALUATION_DEPTH,
            user_id: String::new(),
        }
    }
}

impl RenderOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = (page_size > 0).then_some(page_size);
        self
    }

    pub fn with_execution_time(mut self, execution_time: NaiveDateTime) -> Self {
        self.execution_time = Some(execution_time);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Globals for one render of `report_name`
    pub fn globals(&self, report_name: &str, report_language: Option<&str>) -> Globals {
        Globals {
            execution_time: self
                .execution_time
                .unwrap_or_else(|| Local::now().naive_local()),
            report_name: report_name.to_string(),
            page_number: 1,
            total_pages: 1,
            language: report_language
                .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('='))
                .unwrap_or(&self.language)
                .to_string(),
            user_id: self.user_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_language_wins() {
        let options = RenderOptions::default().with_language("de-DE");
        assert_eq!(options.globals("R", Some("fr-FR")).language, "fr-FR");
        assert_eq!(options.globals("R", None).language, "de-DE");
        assert_eq!(options.globals("R", Some("=User!Language")).language, "de-DE");
    }

    #[test]
    fn test_zero_page_size_disables_windowing() {
        assert_eq!(RenderOptions::default().with_page_size(0).page_size, None);
        assert_eq!(RenderOptions::default().with_page_size(25).page_size, Some(25));
    }
}
