//! Validate command implementation
//!
//! A report is invalid when it does not load or when rendering would fail
//! on configuration (unregistered data sources, unknown sub-reports).
//! Malformed expressions only degrade to empty text at render time, so they
//! are reported as warnings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use colored::Colorize;
use rdl_diagnostics::{Diagnostic, RDL0004, RDL0300, RdlError, Severity};
use rdl_model::{ItemKind, Report, ReportRegistry, TablixMember};
use rdl_parser::{is_expression, parse_expression};
use rdl_render::ReportRenderer;

use super::output;

/// Configuration for the validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    /// Treat warnings as errors
    pub strict: bool,
    pub report_paths: Vec<PathBuf>,
}

/// Diagnostics of one file
pub struct ValidationResult {
    pub file: PathBuf,
    pub diagnostics: Vec<(String, Diagnostic)>,
}

impl ValidationResult {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }
}

pub async fn validate(config: ValidateConfig) -> Result<()> {
    if config.files.is_empty() {
        bail!("No files specified for validation");
    }

    let registry = ReportRegistry::new();
    for dir in &config.report_paths {
        registry.load_directory(dir)?;
    }
    // Every named file is registered first so they can reference each other
    let loaded: Vec<_> = config
        .files
        .iter()
        .map(|file| registry.load_report_file(file))
        .collect();

    let renderer = ReportRenderer::new(registry);
    let results: Vec<ValidationResult> = config
        .files
        .iter()
        .zip(loaded)
        .map(|(file, report)| match report {
            Ok(report) => validate_report(&renderer, file, &report),
            Err(err) => ValidationResult {
                file: file.clone(),
                diagnostics: vec![("load".to_string(), RdlError::from(err).to_diagnostic())],
            },
        })
        .collect();

    for result in &results {
        print_validation_result(result);
    }

    let errors: usize = results.iter().map(ValidationResult::errors).sum();
    let warnings: usize = results.iter().map(ValidationResult::warnings).sum();

    println!();
    if errors == 0 && warnings == 0 {
        println!(
            "{}",
            output::format_success(&format!("All {} file(s) validated successfully", results.len()))
        );
        return Ok(());
    }

    let mut summary = Vec::new();
    if errors > 0 {
        summary.push(format!("{} error(s)", errors).red().to_string());
    }
    if warnings > 0 {
        summary.push(format!("{} warning(s)", warnings).yellow().to_string());
    }
    eprintln!("{} Found {}", "Validation:".bold(), summary.join(", "));

    if errors > 0 || (config.strict && warnings > 0) {
        bail!("Validation failed");
    }
    Ok(())
}

/// Check one loaded report
pub fn validate_report(renderer: &ReportRenderer, file: &Path, report: &Report) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if let Err(err) = renderer.validate(report) {
        diagnostics.push(("report".to_string(), RdlError::from(err).to_diagnostic()));
    }

    let mut names = HashSet::new();
    for item in report.all_items() {
        if !item.name.is_empty() && !names.insert(item.name.to_ascii_lowercase()) {
            diagnostics.push((
                item.name.clone(),
                Diagnostic::warning(RDL0300, format!("Duplicate item name '{}'", item.name)),
            ));
        }
    }

    for (location, text) in expressions(report) {
        match parse_expression(&text) {
            Ok(parsed) => {
                for fragment in parsed.inner.unresolved_fragments() {
                    let message = format!("'{}' renders empty: {}", fragment.text, fragment.reason);
                    diagnostics.push((location.clone(), Diagnostic::warning(RDL0004, message)));
                }
            }
            Err(err) => {
                let mut diagnostic = err.to_diagnostic();
                diagnostic.severity = Severity::Warning;
                diagnostics.push((location, diagnostic.with_help(format!("in {}", text))));
            }
        }
    }

    ValidationResult {
        file: file.to_path_buf(),
        diagnostics,
    }
}

/// Every `=` expression of the report, with where it appears
fn expressions(report: &Report) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut push = |location: String, text: &str| {
        if is_expression(text) {
            out.push((location, text.to_string()));
        }
    };

    for parameter in &report.parameters {
        for value in &parameter.default_values {
            push(format!("parameter {}", parameter.name), value);
        }
    }
    for data_set in &report.data_sets {
        for parameter in &data_set.query.parameters {
            push(format!("{}.{}", data_set.name, parameter.name), &parameter.value);
        }
        for field in &data_set.fields {
            if let Some(value) = &field.value {
                push(format!("{}.{}", data_set.name, field.name), value);
            }
        }
    }

    for item in report.all_items() {
        if let Some(hidden) = item.visibility.as_ref().and_then(|v| v.hidden.as_deref()) {
            push(format!("{} visibility", item.name), hidden);
        }
        match &item.kind {
            ItemKind::Textbox(textbox) => {
                for run in &textbox.runs {
                    push(item.name.clone(), run);
                }
            }
            ItemKind::Tablix(tablix) => {
                if let Some(message) = &tablix.no_rows_message {
                    push(format!("{} NoRowsMessage", item.name), message);
                }
                let mut members: Vec<&TablixMember> = tablix
                    .row_hierarchy
                    .iter()
                    .chain(&tablix.column_hierarchy)
                    .collect();
                while let Some(member) = members.pop() {
                    if let Some(group) = &member.group {
                        for expression in &group.expressions {
                            push(format!("group {}", group.name), expression);
                        }
                    }
                    for sort in &member.sort_expressions {
                        push(format!("{} sort", item.name), &sort.value);
                    }
                    members.extend(&member.children);
                }
            }
            ItemKind::Subreport(subreport) => {
                for parameter in &subreport.parameters {
                    push(format!("{}.{}", item.name, parameter.name), &parameter.value);
                }
            }
            ItemKind::Image(image) => push(item.name.clone(), &image.value),
            ItemKind::Rectangle(_) | ItemKind::Line => {}
        }
    }
    out
}

fn print_validation_result(result: &ValidationResult) {
    let status = if result.errors() == 0 {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("{} {}", status, result.file.display());
    for (location, diagnostic) in &result.diagnostics {
        println!("{}", output::format_diagnostic(location, diagnostic));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rdl_diagnostics::{RDL0301, RDL0302};
    use rdl_model::{QueryParameter, ReportItem, Subreport};

    fn check(report: &Report) -> ValidationResult {
        let renderer = ReportRenderer::new(ReportRegistry::new());
        validate_report(&renderer, Path::new("Test.rdl"), report)
    }

    #[test]
    fn test_clean_report() {
        let mut report = Report::new("Clean");
        report.body.items.push(ReportItem::textbox("Title", "=\"Sales\" & 1"));
        let result = check(&report);
        assert_eq!(result.errors(), 0);
        assert_eq!(result.warnings(), 0);
    }

    #[test]
    fn test_malformed_expression_is_a_warning() {
        let mut report = Report::new("Broken");
        report.body.items.push(ReportItem::textbox("Title", "=Left(\"abc\""));
        let result = check(&report);

        assert_eq!(result.errors(), 0);
        assert_eq!(result.warnings(), 1);
        assert_eq!(result.diagnostics[0].0, "Title");
    }

    #[test]
    fn test_duplicate_names_warn() {
        let mut report = Report::new("Dupes");
        report.body.items.push(ReportItem::textbox("Title", "a"));
        report.body.items.push(ReportItem::textbox("title", "b"));
        assert_eq!(check(&report).warnings(), 1);
    }

    #[test]
    fn test_configuration_errors() {
        let mut report = Report::new("Orders");
        report.data_sets.push(rdl_model::DataSet {
            name: "Lines".into(),
            ..rdl_model::DataSet::default()
        });
        report.data_sets[0].query.data_source_name = "Warehouse".into();
        let result = check(&report);
        assert_eq!(result.errors(), 1);
        assert_eq!(result.diagnostics[0].1.code, RDL0301);

        let mut report = Report::new("Parent");
        report.body.items.push(ReportItem::new(
            "Child",
            ItemKind::Subreport(Subreport {
                report_name: "Missing".into(),
                parameters: vec![QueryParameter {
                    name: "Id".into(),
                    value: "=1 +".into(),
                }],
                no_rows_message: None,
            }),
        ));
        let result = check(&report);
        assert_eq!(result.errors(), 1);
        assert_eq!(result.diagnostics[0].1.code, RDL0302);
        assert_eq!(result.warnings(), 1);
    }
}
