//! CLI functionality for the `rdl` tool
//!
//! - `render`: render a report to HTML
//! - `params`: show how a report's parameters resolve
//! - `eval`: evaluate one expression against a data file
//! - `validate`: load reports and check their expressions and references

pub mod eval;
pub mod output;
pub mod params;
pub mod render;
pub mod resolver;
pub mod validate;

use anyhow::{Result, bail};
use rdl_render::ParameterInput;

/// Parse `name=value` arguments; a repeated name collects several values
pub fn parse_parameters(args: &[String]) -> Result<Vec<ParameterInput>> {
    let mut inputs: Vec<ParameterInput> = Vec::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("Invalid parameter '{}': expected name=value", arg);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid parameter '{}': empty name", arg);
        }
        match inputs.iter_mut().find(|i| i.name.eq_ignore_ascii_case(name)) {
            Some(existing) => {
                let mut values = existing.texts();
                values.push(value.to_string());
                *existing = ParameterInput::multi(existing.name.clone(), values);
            }
            None => inputs.push(ParameterInput::single(name, value)),
        }
    }
    Ok(inputs)
}
