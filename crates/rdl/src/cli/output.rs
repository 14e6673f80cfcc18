//! Output formatting utilities

use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use rdl_diagnostics::Diagnostic;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    let enabled = match mode.to_ascii_lowercase().as_str() {
        "always" => true,
        "never" => false,
        _ => std::io::stdout().is_terminal(),
    };
    colored::control::set_override(enabled);
}

pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// One diagnostic line, prefixed with where it was found
pub fn format_diagnostic(location: &str, diagnostic: &Diagnostic) -> String {
    format!("  {} {}", location.cyan(), diagnostic.to_colored_string())
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!(
                "{}",
                format_success(&format!("Output written to {}", path.display()))
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn format_json(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize JSON")
}
