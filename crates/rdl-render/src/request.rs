//! Request and response documents
//!
//! These are the JSON shapes a host exchanges with the renderer:
//!
//! ```json
//! {
//!   "Parameters": [{ "Name": "Region", "Value": "NW" }],
//!   "ToggleRequests": ["g1"],
//!   "Metadata": [{ "key": "key_tablixpage", "objectName": "T1", "value": "2" }],
//!   "Navigate": { "table": "T1", "direction": "next" }
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::pagination::MetadataEntry;

/// Expanded toggle keys of one request
pub type ToggleSet = HashSet<String>;

/// A parameter value supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl ParameterInput {
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            values: Vec::new(),
        }
    }

    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            values,
        }
    }

    /// Supplied values: the list when given, else the single value
    pub fn texts(&self) -> Vec<String> {
        if self.values.is_empty() {
            self.value.iter().cloned().collect()
        } else {
            self.values.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Page navigation for one Tablix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigate {
    pub table: String,
    pub direction: Direction,
}

impl Navigate {
    pub fn next(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            direction: Direction::Next,
        }
    }

    pub fn prev(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            direction: Direction::Prev,
        }
    }
}

/// Parameter collection request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ParameterRequest {
    pub parameters: Vec<ParameterInput>,
}

/// Report render request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RenderRequest {
    pub parameters: Vec<ParameterInput>,
    pub toggle_requests: Vec<String>,
    pub metadata: Vec<MetadataEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate: Option<Navigate>,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> RenderResult<Self> {
        serde_json::from_str(text).map_err(|e| RenderError::Request(e.to_string()))
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(ParameterInput::single(name, value));
        self
    }

    pub fn with_toggle(mut self, key: impl Into<String>) -> Self {
        self.toggle_requests.push(key.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_navigate(mut self, navigate: Navigate) -> Self {
        self.navigate = Some(navigate);
        self
    }

    /// Toggle keys as a set; repeating a key changes nothing
    pub fn toggles(&self) -> ToggleSet {
        self.toggle_requests.iter().cloned().collect()
    }
}

/// Rendered report and the page counters to send back next time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
    pub metadata: Vec<MetadataEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_json_shape() {
        let request = RenderRequest::from_json(
            r#"{
                "Parameters": [{ "Name": "Region", "Value": "NW" }, { "Name": "Years", "Values": ["2023", "2024"] }],
                "ToggleRequests": ["g1", "g1"],
                "Metadata": [{ "key": "key_tablixpage", "objectName": "T1", "value": "3" }],
                "Navigate": { "table": "T1", "direction": "prev" }
            }"#,
        )
        .unwrap();

        assert_eq!(request.parameters[0].texts(), vec!["NW".to_string()]);
        assert_eq!(request.parameters[1].texts().len(), 2);
        assert_eq!(request.toggles().len(), 1);
        assert_eq!(request.metadata[0].object_name, "T1");
        assert_eq!(request.navigate, Some(Navigate::prev("T1")));
    }

    #[test]
    fn test_missing_sections_default() {
        let request = RenderRequest::from_json("{}").unwrap();
        assert_eq!(request, RenderRequest::default());
        assert!(RenderRequest::from_json("[").is_err());
    }
}
