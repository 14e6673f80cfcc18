//! Report parameter resolution and the parameter form
//!
//! Each declared parameter takes, in order: the request's value(s)
//! converted to its data type, its default values (an `=` default is
//! evaluated against the parameters resolved before it), Nothing when it is
//! nullable. Otherwise it stays missing and the render stops at the
//! parameter form.

use std::fmt::Write;

use log::debug;
use rdl_eval::{EvaluationContext, Globals, ParameterValue, Parameters, ReportEngine};
use rdl_model::{ParameterDataType, Report, ReportData, ReportParameter};
use rdl_parser::is_expression;
use rdl_types::ReportValue;

use crate::error::RenderResult;
use crate::html::{escape_attr, escape_text, open_tag};
use crate::request::ParameterInput;

/// Where a parameter's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    Request,
    Default,
    Null,
    Missing,
}

/// Resolution result of one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterState {
    pub name: String,
    pub source: ParameterSource,
    /// Text shown in the form
    pub texts: Vec<String>,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameters {
    pub values: Parameters,
    pub states: Vec<ParameterState>,
}

impl ResolvedParameters {
    /// Every parameter has a satisfying value
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|state| state.satisfied)
    }

    pub fn state(&self, name: &str) -> Option<&ParameterState> {
        self.states.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &str> {
        self.states
            .iter()
            .filter(|s| !s.satisfied)
            .map(|s| s.name.as_str())
    }
}

/// Resolve the report's parameters against the caller's input
pub fn resolve_parameters(
    engine: &ReportEngine,
    report: &Report,
    data: &ReportData,
    globals: &Globals,
    inputs: &[ParameterInput],
) -> RenderResult<ResolvedParameters> {
    let mut resolved = ResolvedParameters::default();

    for parameter in &report.parameters {
        let input = inputs
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(&parameter.name))
            .map(ParameterInput::texts)
            .filter(|texts| !texts.is_empty());

        let state = match input {
            Some(texts) => {
                let converted: Option<Vec<ReportValue>> = texts
                    .iter()
                    .map(|text| convert_text(text, parameter.data_type))
                    .collect();
                let satisfied = parameter.nullable
                    || parameter.has_default()
                    || (converted.is_some() && satisfies(parameter, &texts));
                match converted {
                    Some(values) => {
                        resolved.values.insert(&parameter.name, labelled(parameter, values));
                    }
                    None => debug!(
                        "Parameter '{}' value {:?} is not a valid {:?}",
                        parameter.name, texts, parameter.data_type
                    ),
                }
                ParameterState {
                    name: parameter.name.clone(),
                    source: ParameterSource::Request,
                    texts,
                    satisfied,
                }
            }
            None if parameter.has_default() => {
                let values = evaluate_defaults(engine, report, data, globals, &resolved.values, parameter)?;
                let texts = values.iter().map(ReportValue::to_text).collect();
                resolved.values.insert(&parameter.name, labelled(parameter, values));
                ParameterState {
                    name: parameter.name.clone(),
                    source: ParameterSource::Default,
                    texts,
                    satisfied: true,
                }
            }
            None if parameter.nullable => {
                resolved.values.insert(&parameter.name, ParameterValue::default());
                ParameterState {
                    name: parameter.name.clone(),
                    source: ParameterSource::Null,
                    texts: Vec::new(),
                    satisfied: true,
                }
            }
            None => {
                debug!("Parameter '{}' has no value", parameter.name);
                ParameterState {
                    name: parameter.name.clone(),
                    source: ParameterSource::Missing,
                    texts: Vec::new(),
                    satisfied: false,
                }
            }
        };
        resolved.states.push(state);
    }

    Ok(resolved)
}

fn evaluate_defaults(
    engine: &ReportEngine,
    report: &Report,
    data: &ReportData,
    globals: &Globals,
    resolved: &Parameters,
    parameter: &ReportParameter,
) -> RenderResult<Vec<ReportValue>> {
    let ctx = EvaluationContext::new(&report.data_sets, data, resolved, globals);
    let mut values = Vec::with_capacity(parameter.default_values.len());
    for default in &parameter.default_values {
        let value = if is_expression(default) {
            let value = engine.evaluate(default, &ctx)?;
            if parameter.data_type == ParameterDataType::String || value.is_null() {
                value
            } else {
                value
                    .convert_to(parameter.data_type.value_type())
                    .unwrap_or(value)
            }
        } else {
            convert_text(default, parameter.data_type).unwrap_or_else(|| ReportValue::string(default))
        };
        values.push(value);
    }
    Ok(values)
}

/// Request text as a value of the parameter's type. Blank input to a
/// non-string parameter is Nothing.
fn convert_text(text: &str, data_type: ParameterDataType) -> Option<ReportValue> {
    if data_type == ParameterDataType::String {
        return Some(ReportValue::string(text));
    }
    if text.trim().is_empty() {
        return Some(ReportValue::Null);
    }
    ReportValue::string(text.trim())
        .convert_to(data_type.value_type())
        .ok()
}

fn satisfies(parameter: &ReportParameter, texts: &[String]) -> bool {
    texts.iter().all(|text| {
        if text.trim().is_empty() && !parameter.allow_blank {
            return false;
        }
        parameter.valid_values.is_empty() || parameter.valid_values.iter().any(|v| v.value == *text)
    })
}

/// Attach valid-value labels to the values that have one
fn labelled(parameter: &ReportParameter, values: Vec<ReportValue>) -> ParameterValue {
    if parameter.valid_values.is_empty() {
        return ParameterValue::multi(values);
    }
    let labels = values
        .iter()
        .map(|value| {
            let text = value.to_text();
            parameter
                .valid_values
                .iter()
                .find(|v| v.value == text)
                .map_or(text, |v| v.label().to_string())
        })
        .collect();
    ParameterValue::multi(values).with_labels(labels)
}

/// HTML form collecting the visible parameters. The run button appears
/// only once every parameter is satisfied.
pub fn render_parameter_form(report: &Report, resolved: &ResolvedParameters) -> String {
    let mut html = open_tag(
        "form",
        &[("class", "rdl-parameters"), ("data-report", &report.name)],
    );

    for parameter in report.parameters.iter().filter(|p| !p.hidden) {
        let texts = resolved
            .state(&parameter.name)
            .map(|s| s.texts.as_slice())
            .unwrap_or_default();
        let id = format!("rdl-param-{}", parameter.name);

        let _ = write!(
            html,
            "<div class=\"rdl-parameter\"><label for=\"{}\">{}</label>",
            escape_attr(&id),
            escape_text(parameter.display_prompt())
        );

        if parameter.valid_values.is_empty() && !parameter.multi_value {
            let value = texts.first().map(String::as_str).unwrap_or_default();
            html.push_str(&open_tag(
                "input",
                &[
                    ("type", "text"),
                    ("id", &id),
                    ("name", &parameter.name),
                    ("value", value),
                ],
            ));
        } else {
            let mut attrs = vec![("id", id.as_str()), ("name", parameter.name.as_str())];
            if parameter.multi_value {
                attrs.push(("multiple", "multiple"));
            }
            html.push_str(&open_tag("select", &attrs));
            if parameter.valid_values.is_empty() {
                for text in texts {
                    let _ = write!(
                        html,
                        "<option value=\"{}\" selected=\"selected\">{}</option>",
                        escape_attr(text),
                        escape_text(text)
                    );
                }
            }
            for valid in &parameter.valid_values {
                let selected = if texts.contains(&valid.value) {
                    " selected=\"selected\""
                } else {
                    ""
                };
                let _ = write!(
                    html,
                    "<option value=\"{}\"{}>{}</option>",
                    escape_attr(&valid.value),
                    selected,
                    escape_text(valid.label())
                );
            }
            html.push_str("</select>");
        }
        html.push_str("</div>");
    }

    if resolved.is_complete() {
        html.push_str("<button type=\"submit\" class=\"rdl-run\">View Report</button>");
    }
    html.push_str("</form>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rdl_model::ValidValue;

    fn region() -> ReportParameter {
        ReportParameter {
            valid_values: vec![
                ValidValue {
                    value: "E".into(),
                    label: Some("East".into()),
                },
                ValidValue {
                    value: "W".into(),
                    label: Some("West".into()),
                },
            ],
            ..ReportParameter::new("Region")
        }
    }

    fn resolve(report: &Report, inputs: &[ParameterInput]) -> ResolvedParameters {
        resolve_parameters(
            &ReportEngine::new(),
            report,
            &ReportData::new(),
            &Globals::for_report(&report.name),
            inputs,
        )
        .unwrap()
    }

    #[test]
    fn test_request_value_with_label() {
        let mut report = Report::new("Sales");
        report.parameters.push(region());

        let resolved = resolve(&report, &[ParameterInput::single("region", "W")]);
        assert!(resolved.is_complete());
        let value = resolved.values.get("Region").unwrap();
        assert_eq!(value.value(), ReportValue::string("W"));
        assert_eq!(value.label(), ReportValue::string("West"));
    }

    #[test]
    fn test_value_outside_valid_list_is_unsatisfied() {
        let mut report = Report::new("Sales");
        report.parameters.push(region());

        let resolved = resolve(&report, &[ParameterInput::single("Region", "N")]);
        assert!(!resolved.is_complete());
        assert_eq!(resolved.unsatisfied().collect::<Vec<_>>(), vec!["Region"]);
    }

    #[test]
    fn test_defaults_see_earlier_parameters() {
        let mut report = Report::new("Sales");
        report.parameters.push(ReportParameter {
            data_type: ParameterDataType::Integer,
            default_values: vec!["10".into()],
            ..ReportParameter::new("Base")
        });
        report.parameters.push(ReportParameter {
            data_type: ParameterDataType::Integer,
            default_values: vec!["=Parameters!Base.Value + 5".into()],
            ..ReportParameter::new("Limit")
        });

        let resolved = resolve(&report, &[]);
        assert!(resolved.is_complete());
        assert_eq!(
            resolved.values.get("Limit").map(ParameterValue::value),
            Some(ReportValue::Integer(15))
        );
        assert_eq!(resolved.state("Limit").unwrap().source, ParameterSource::Default);
    }

    #[test]
    fn test_nullable_and_missing() {
        let mut report = Report::new("Sales");
        report.parameters.push(ReportParameter {
            nullable: true,
            ..ReportParameter::new("Optional")
        });
        report.parameters.push(ReportParameter::new("Required"));

        let resolved = resolve(&report, &[]);
        assert_eq!(resolved.state("Optional").unwrap().source, ParameterSource::Null);
        assert_eq!(resolved.state("Required").unwrap().source, ParameterSource::Missing);
        assert!(!resolved.values.contains("Required"));
        assert!(!resolved.is_complete());
    }

    #[test]
    fn test_blank_needs_allow_blank() {
        let mut report = Report::new("Sales");
        report.parameters.push(ReportParameter::new("Note"));
        assert!(!resolve(&report, &[ParameterInput::single("Note", "")]).is_complete());

        report.parameters[0].allow_blank = true;
        assert!(resolve(&report, &[ParameterInput::single("Note", "")]).is_complete());
    }

    #[test]
    fn test_unparseable_integer_is_unsatisfied() {
        let mut report = Report::new("Sales");
        report.parameters.push(ReportParameter {
            data_type: ParameterDataType::Integer,
            ..ReportParameter::new("Year")
        });
        let resolved = resolve(&report, &[ParameterInput::single("Year", "soon")]);
        assert!(!resolved.is_complete());
        assert!(!resolved.values.contains("Year"));
    }

    #[test]
    fn test_form_run_button_only_when_complete() {
        let mut report = Report::new("Sales");
        report.parameters.push(region());
        report.parameters.push(ReportParameter {
            hidden: true,
            ..ReportParameter::new("Secret")
        });

        let incomplete = render_parameter_form(&report, &resolve(&report, &[]));
        assert!(incomplete.contains("<select id=\"rdl-param-Region\" name=\"Region\">"));
        assert!(!incomplete.contains("Secret"));
        assert!(!incomplete.contains("rdl-run"));

        report.parameters.pop();
        let complete = render_parameter_form(&report, &resolve(&report, &[ParameterInput::single("Region", "E")]));
        assert!(complete.contains("<option value=\"E\" selected=\"selected\">East</option>"));
        assert!(complete.contains("rdl-run"));
    }
}
