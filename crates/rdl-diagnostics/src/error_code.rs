//! Structured error codes
//!
//! Error code ranges:
//! - RDL0001-RDL0099: Expression scan/parse errors
//! - RDL0100-RDL0199: Report definition load errors
//! - RDL0200-RDL0299: Evaluation errors (runtime)
//! - RDL0300-RDL0399: Configuration errors (data sources, sub-reports)
//! - RDL0400-RDL0499: System errors (I/O, providers)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_load_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_configuration_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RDL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Scan/parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of expression"));
    map.insert(3, ErrorInfo::new("Unbalanced parentheses"));
    map.insert(4, ErrorInfo::new("Invalid argument count"));
    map.insert(5, ErrorInfo::new("Unterminated string literal"));
    map.insert(
        6,
        ErrorInfo::new("Expression nesting too deep")
            .with_help("Reduce the number of nested calls or parenthesised groups"),
    );

    // Load errors (0100-0199)
    map.insert(100, ErrorInfo::new("Malformed report definition XML"));
    map.insert(101, ErrorInfo::new("Missing required element"));
    map.insert(102, ErrorInfo::new("Invalid size value"));
    map.insert(103, ErrorInfo::new("Invalid attribute value"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Evaluation failed"));
    map.insert(
        201,
        ErrorInfo::new("Conversion failed")
            .with_help("The value cannot be converted by the explicit conversion function"),
    );
    map.insert(202, ErrorInfo::new("Recursion limit exceeded"));

    // Configuration errors (0300-0399)
    map.insert(300, ErrorInfo::new("Configuration error"));
    map.insert(
        301,
        ErrorInfo::new("Unregistered data source")
            .with_help("Declare the data source in the report or register it as a shared data source"),
    );
    map.insert(302, ErrorInfo::new("Unregistered sub-report"));
    map.insert(303, ErrorInfo::new("Unknown report"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Data provider failed"));
    map.insert(403, ErrorInfo::new("Invalid request format"));

    map
});

// Scan/parse errors
pub const RDL0001: ErrorCode = ErrorCode::new(1);
pub const RDL0002: ErrorCode = ErrorCode::new(2);
pub const RDL0003: ErrorCode = ErrorCode::new(3);
pub const RDL0004: ErrorCode = ErrorCode::new(4);
pub const RDL0005: ErrorCode = ErrorCode::new(5);
pub const RDL0006: ErrorCode = ErrorCode::new(6);

// Load errors
pub const RDL0100: ErrorCode = ErrorCode::new(100);
pub const RDL0101: ErrorCode = ErrorCode::new(101);
pub const RDL0102: ErrorCode = ErrorCode::new(102);
pub const RDL0103: ErrorCode = ErrorCode::new(103);

// Evaluation errors
pub const RDL0200: ErrorCode = ErrorCode::new(200);
pub const RDL0201: ErrorCode = ErrorCode::new(201);
pub const RDL0202: ErrorCode = ErrorCode::new(202);

// Configuration errors
pub const RDL0300: ErrorCode = ErrorCode::new(300);
pub const RDL0301: ErrorCode = ErrorCode::new(301);
pub const RDL0302: ErrorCode = ErrorCode::new(302);
pub const RDL0303: ErrorCode = ErrorCode::new(303);

// System errors
pub const RDL0400: ErrorCode = ErrorCode::new(400);
pub const RDL0401: ErrorCode = ErrorCode::new(401);
pub const RDL0402: ErrorCode = ErrorCode::new(402);
pub const RDL0403: ErrorCode = ErrorCode::new(403);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(RDL0001.to_string(), "RDL0001");
        assert_eq!(RDL0301.to_string(), "RDL0301");
    }

    #[test]
    fn test_error_categories() {
        assert!(RDL0001.is_parse_error());
        assert!(!RDL0001.is_load_error());
        assert!(RDL0100.is_load_error());
        assert!(RDL0201.is_evaluation_error());
        assert!(RDL0301.is_configuration_error());
        assert!(RDL0402.is_system_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(RDL0201.info().description, "Conversion failed");
        assert!(RDL0301.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
