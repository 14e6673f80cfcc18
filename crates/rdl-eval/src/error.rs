//! Evaluation errors for the report expression engine
//!
//! Most problems inside an expression degrade to Nothing and never surface
//! here. The variants below are the failures a caller has to see: explicit
//! conversions that cannot succeed and runaway recursion.

use rdl_diagnostics::{ErrorCode, RdlError, RDL0200, RDL0201, RDL0202};
use rdl_types::CoercionError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur during expression evaluation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// An explicit conversion function (`CInt`, `CDate`, ...) could not
    /// convert its argument
    #[error("{function}: cannot convert '{value}': {message}")]
    ConversionFailure {
        function: String,
        value: String,
        message: String,
    },

    /// Parser nesting or calculated-field recursion went past the limit
    #[error("Maximum recursion depth exceeded")]
    RecursionLimit,

    /// Internal error (should not happen)
    #[error("Internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    /// Create a conversion failure
    pub fn conversion_failure(
        function: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConversionFailure {
            function: function.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Wrap a coercion error raised by an explicit conversion
    pub fn from_coercion(function: &str, error: CoercionError) -> Self {
        let value = match &error {
            CoercionError::CannotConvert { value, .. } | CoercionError::Overflow { value, .. } => {
                value.clone()
            }
        };
        Self::conversion_failure(function, value, error.to_string())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, Self::ConversionFailure { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ConversionFailure { .. } => RDL0201,
            Self::RecursionLimit => RDL0202,
            Self::Internal { .. } => RDL0200,
        }
    }
}

impl From<EvalError> for RdlError {
    fn from(error: EvalError) -> Self {
        RdlError::evaluation(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdl_types::ValueType;

    #[test]
    fn test_coercion_error_keeps_value() {
        let err = EvalError::from_coercion(
            "CInt",
            CoercionError::CannotConvert {
                value: "abc".to_string(),
                from: ValueType::String,
                to: ValueType::Integer,
            },
        );
        assert!(err.is_conversion_failure());
        assert!(err.to_string().starts_with("CInt: cannot convert 'abc'"));
        assert_eq!(RdlError::from(err).code(), RDL0201);
    }
}
