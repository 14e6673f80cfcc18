//! Params command implementation

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use rdl_model::{Report, ReportData, ReportRegistry};
use rdl_render::{ParameterSource, ParameterState, ReportRenderer, ResolvedParameters, render_parameter_form};
use serde_json::{Value, json};

use super::output::{self, OutputFormat};
use super::parse_parameters;
use super::resolver::ReportResolver;

/// Configuration for the params command
pub struct ParamsConfig {
    pub file: PathBuf,
    pub params: Vec<String>,
    /// Write the HTML parameter form instead of the summary
    pub form: bool,
    pub report_paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

pub async fn params(config: ParamsConfig) -> Result<()> {
    let resolver = ReportResolver::new(config.report_paths.clone());
    let report = resolver.load(&config.file)?;
    let resolved = resolve(resolver.registry(), &report, &config.params)?;

    let content = if config.form {
        render_parameter_form(&report, &resolved)
    } else {
        match config.format {
            OutputFormat::Json => output::format_json(&summary_json(&resolved))?,
            OutputFormat::Text => summary_text(&report, &resolved),
        }
    };
    output::write_output(&content, config.output_file.as_deref())
}

pub fn resolve(registry: &ReportRegistry, report: &Report, args: &[String]) -> Result<ResolvedParameters> {
    let inputs = parse_parameters(args)?;
    let renderer = ReportRenderer::new(registry.clone());
    Ok(renderer.resolve_parameters(report, &ReportData::new(), &inputs)?)
}

fn source_name(source: ParameterSource) -> &'static str {
    match source {
        ParameterSource::Request => "request",
        ParameterSource::Default => "default",
        ParameterSource::Null => "null",
        ParameterSource::Missing => "missing",
    }
}

fn summary_json(resolved: &ResolvedParameters) -> Value {
    let parameters: Vec<Value> = resolved
        .states
        .iter()
        .map(|state| {
            json!({
                "name": state.name,
                "source": source_name(state.source),
                "values": state.texts,
                "satisfied": state.satisfied,
            })
        })
        .collect();
    json!({ "complete": resolved.is_complete(), "parameters": parameters })
}

fn state_line(state: &ParameterState) -> String {
    let mark = if state.satisfied {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    let values = if state.texts.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        state.texts.join(", ")
    };
    format!("{} {} = {} [{}]", mark, state.name.bold(), values, source_name(state.source))
}

fn summary_text(report: &Report, resolved: &ResolvedParameters) -> String {
    let mut lines = vec![format!("Report {}", report.name.cyan())];
    if resolved.states.is_empty() {
        lines.push("  (no parameters)".to_string());
    }
    lines.extend(resolved.states.iter().map(|s| format!("  {}", state_line(s))));
    if !resolved.is_complete() {
        let missing: Vec<&str> = resolved.unsatisfied().collect();
        lines.push(output::format_warning(&format!("Missing values for {}", missing.join(", "))));
    }
    lines.join("\n")
}
