//! Eval command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use rdl_eval::{EvaluationEnvironment, Globals, ParameterValue, Parameters, ReportEngine};
use rdl_model::{DataRow, ReportData};
use rdl_parser::is_expression;
use rdl_types::ReportValue;
use serde_json::json;

use super::output::{self, OutputFormat};
use super::parse_parameters;

/// Configuration for the eval command
pub struct EvalConfig {
    pub expression: String,
    pub data: Option<PathBuf>,
    /// Data set the expression is scoped to; its first row is current
    pub dataset: Option<String>,
    pub params: Vec<String>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

pub async fn eval(config: EvalConfig) -> Result<()> {
    let data = match &config.data {
        Some(path) => ReportData::from_json_file(path)
            .with_context(|| format!("Failed to load data file: {}", path.display()))?,
        None => ReportData::new(),
    };

    let value = evaluate(&config.expression, data, config.dataset.as_deref(), &config.params)?;
    let content = match config.format {
        OutputFormat::Json => output::format_json(&json!({
            "type": value.value_type().to_string(),
            "value": value.to_text(),
        }))?,
        OutputFormat::Text => value.to_text(),
    };
    output::write_output(&content, config.output_file.as_deref())
}

/// Evaluate `expression` over `data`, optionally scoped to one data set.
/// Text without a leading `=` is returned as is.
pub fn evaluate(expression: &str, data: ReportData, dataset: Option<&str>, params: &[String]) -> Result<ReportValue> {
    if !is_expression(expression) {
        return Ok(ReportValue::string(expression));
    }

    let mut parameters = Parameters::new();
    for input in parse_parameters(params)? {
        let values = input.texts().into_iter().map(ReportValue::string);
        parameters.insert(input.name, ParameterValue::multi(values));
    }

    let env = EvaluationEnvironment::new()
        .with_data(data)
        .with_parameters(parameters)
        .with_globals(Globals::for_report("Expression"));
    let engine = ReportEngine::new();
    let ctx = env.context();

    let value = match dataset {
        Some(name) => {
            let rows: Vec<&DataRow> = env
                .data
                .rows(name)
                .with_context(|| format!("Data set '{}' not found in data file", name))?
                .iter()
                .collect();
            engine.evaluate(expression, &ctx.with_dataset(name).with_scope(&rows))?
        }
        None => engine.evaluate(expression, &ctx)?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sales() -> ReportData {
        ReportData::from_json(r#"{ "Sales": [{ "Amount": 2 }, { "Amount": 5 }] }"#).unwrap()
    }

    #[rstest]
    #[case("=1 + 2 * 3", "9")]
    #[case("=UCase(\"abc\") & \"!\"", "ABC!")]
    #[case("plain text", "plain text")]
    fn test_free_standing_expressions(#[case] expression: &str, #[case] expected: &str) {
        let value = evaluate(expression, ReportData::new(), None, &[]).unwrap();
        assert_eq!(value.to_text(), expected);
    }

    #[test]
    fn test_scoped_to_data_set() {
        let value = evaluate("=Sum(Fields!Amount.Value)", sales(), Some("Sales"), &[]).unwrap();
        assert_eq!(value.to_text(), "7");

        let first = evaluate("=Fields!Amount.Value", sales(), Some("Sales"), &[]).unwrap();
        assert_eq!(first.to_text(), "2");
    }

    #[test]
    fn test_parameters_are_strings() {
        let value = evaluate("=Parameters!Region.Value & \"-\"", ReportData::new(), None, &["Region=NW".to_string()]).unwrap();
        assert_eq!(value.to_text(), "NW-");
    }

    #[test]
    fn test_unknown_data_set() {
        assert!(evaluate("=1", sales(), Some("Orders"), &[]).is_err());
    }
}
