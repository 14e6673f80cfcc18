//! Render command implementation

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use rdl_model::{DataSetProvider, InMemoryProvider};
use rdl_render::{Navigate, RenderOptions, RenderOutcome, RenderRequest, ReportService};

use super::output::{self, OutputFormat};
use super::parse_parameters;
use super::resolver::ReportResolver;

/// Configuration for the render command
pub struct RenderConfig {
    pub file: PathBuf,
    pub data: Option<PathBuf>,
    pub request: Option<PathBuf>,
    pub params: Vec<String>,
    pub toggles: Vec<String>,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub page_size: Option<usize>,
    pub report_paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Build the request from the request file, then the command-line flags
pub fn build_request(config: &RenderConfig) -> Result<RenderRequest> {
    let mut request = match &config.request {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file: {}", path.display()))?;
            RenderRequest::from_json(&text)
                .with_context(|| format!("Failed to parse request file: {}", path.display()))?
        }
        None => RenderRequest::new(),
    };

    request.parameters.extend(parse_parameters(&config.params)?);
    request.toggle_requests.extend(config.toggles.iter().cloned());
    if let Some(table) = &config.next {
        request.navigate = Some(Navigate::next(table.clone()));
    } else if let Some(table) = &config.prev {
        request.navigate = Some(Navigate::prev(table.clone()));
    }
    Ok(request)
}

pub async fn render(config: RenderConfig) -> Result<()> {
    let resolver = ReportResolver::new(config.report_paths.clone());
    let report = resolver.load(&config.file)?;
    info!("Rendering {}", config.file.display());

    let provider: Arc<dyn DataSetProvider> = match &config.data {
        Some(path) => Arc::new(
            InMemoryProvider::from_json_file(path)
                .with_context(|| format!("Failed to load data file: {}", path.display()))?,
        ),
        None => Arc::new(InMemoryProvider::lenient()),
    };

    let mut options = RenderOptions::default();
    if let Some(page_size) = config.page_size {
        options = options.with_page_size(page_size);
    }

    let request = build_request(&config)?;
    let service = ReportService::new(resolver.registry().clone(), provider).with_options(options);
    let outcome = service
        .render(&report.name, &request)
        .await
        .with_context(|| format!("Failed to render report '{}'", report.name))?;

    let content = match outcome {
        RenderOutcome::Rendered(response) => match config.format {
            OutputFormat::Json => output::format_json(&serde_json::to_value(&response)?)?,
            OutputFormat::Text => response.html,
        },
        RenderOutcome::IncompleteParameters { form } => {
            eprintln!(
                "{}",
                output::format_warning("Report needs parameter values; writing the parameter form")
            );
            form
        }
    };
    output::write_output(&content, config.output_file.as_deref())
}
