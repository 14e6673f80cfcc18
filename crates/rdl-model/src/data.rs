//! Request-scoped data rows
//!
//! Rows are never stored on the definition tree. A host fetches them per
//! request and hands them to the renderer as [`ReportData`].

use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rdl_types::{parse_datetime, ReportValue};
use serde_json::Value as JsonValue;

/// One result row: field name → value, in column order.
/// Lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    values: IndexMap<String, ReportValue>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ReportValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ReportValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ReportValue> {
        self.values.get(name).or_else(|| {
            self.values
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a row from a JSON object. ISO-8601 date strings become DateTime
    /// values; everything else maps directly.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        Some(
            object
                .iter()
                .map(|(name, value)| (name.clone(), json_to_value(value)))
                .collect(),
        )
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<ReportValue>> FromIterator<(K, V)> for DataRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_to_value(value: &JsonValue) -> ReportValue {
    match value {
        JsonValue::String(s) if looks_like_iso_date(s) => parse_datetime(s)
            .map(ReportValue::DateTime)
            .unwrap_or_else(|| ReportValue::String(s.clone())),
        other => ReportValue::from(other.clone()),
    }
}

fn looks_like_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[7] == b'-'
}

fn value_to_json(value: &ReportValue) -> JsonValue {
    match value {
        ReportValue::Null => JsonValue::Null,
        ReportValue::Boolean(b) => JsonValue::Bool(*b),
        ReportValue::Integer(i) => JsonValue::from(*i),
        ReportValue::Double(d) => JsonValue::from(*d),
        ReportValue::Decimal(d) => JsonValue::String(d.to_string()),
        ReportValue::String(s) => JsonValue::String(s.clone()),
        ReportValue::DateTime(dt) => JsonValue::String(iso(dt)),
    }
}

fn iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Error reading a data file
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data file: {0}")]
    InvalidStructure(String),
}

/// Rows for every data set of one render request, keyed by data set name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    sets: IndexMap<String, Vec<DataRow>>,
}

impl ReportData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, data_set: impl Into<String>, rows: Vec<DataRow>) -> Self {
        self.insert(data_set, rows);
        self
    }

    pub fn insert(&mut self, data_set: impl Into<String>, rows: Vec<DataRow>) {
        self.sets.insert(data_set.into(), rows);
    }

    pub fn rows(&self, data_set: &str) -> Option<&[DataRow]> {
        self.sets
            .get(data_set)
            .or_else(|| {
                self.sets
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(data_set))
                    .map(|(_, rows)| rows)
            })
            .map(Vec::as_slice)
    }

    /// Rows of the only data set, when exactly one is present
    pub fn only(&self) -> Option<(&str, &[DataRow])> {
        match self.sets.len() {
            1 => self
                .sets
                .iter()
                .next()
                .map(|(name, rows)| (name.as_str(), rows.as_slice())),
            _ => None,
        }
    }

    pub fn data_set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Parse `{ "DataSetName": [ { "column": value, ... }, ... ], ... }`
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_json_value(&json)
    }

    pub fn from_json_value(json: &JsonValue) -> Result<Self, DataError> {
        let object = json.as_object().ok_or_else(|| {
            DataError::InvalidStructure("expected an object of data set arrays".to_string())
        })?;

        let mut data = Self::new();
        for (name, rows) in object {
            let rows = rows.as_array().ok_or_else(|| {
                DataError::InvalidStructure(format!("data set '{}' is not an array", name))
            })?;
            let rows = rows
                .iter()
                .map(|row| {
                    DataRow::from_json(row).ok_or_else(|| {
                        DataError::InvalidStructure(format!(
                            "row of data set '{}' is not an object",
                            name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            data.insert(name.clone(), rows);
        }
        Ok(data)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
