//! Render errors
//!
//! Degraded expressions never reach this type. A render fails only when an
//! explicit conversion fails, nesting runs away, the report is wired to a
//! data source or sub-report nobody registered, or data acquisition fails.

use rdl_diagnostics::{ErrorCode, RdlError, RDL0301, RDL0302, RDL0303, RDL0402, RDL0403};
use rdl_eval::EvalError;
use rdl_model::ProviderError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// An expression failure that escaped the engine
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    /// The report references something the host never registered
    #[error("{code}: {message}")]
    Configuration { code: ErrorCode, message: String },

    /// A data set provider failed
    #[error("Data set '{data_set}' could not be fetched: {source}")]
    Provider {
        data_set: String,
        #[source]
        source: ProviderError,
    },

    /// A request document could not be read
    #[error("Invalid request: {0}")]
    Request(String),
}

impl RenderError {
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
        }
    }

    pub fn unregistered_data_source(data_set: &str, data_source: &str) -> Self {
        Self::configuration(
            RDL0301,
            format!(
                "Data set '{}' uses data source '{}', which is not registered",
                data_set, data_source
            ),
        )
    }

    pub fn unregistered_subreport(item: &str, report: &str) -> Self {
        Self::configuration(
            RDL0302,
            format!("Sub-report '{}' references unregistered report '{}'", item, report),
        )
    }

    pub fn unknown_report(name: &str) -> Self {
        Self::configuration(RDL0303, format!("Report '{}' is not registered", name))
    }

    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, Self::Evaluation(err) if err.is_conversion_failure())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Evaluation(err) => err.code(),
            Self::Configuration { code, .. } => *code,
            Self::Provider { .. } => RDL0402,
            Self::Request(_) => RDL0403,
        }
    }
}

impl From<RenderError> for RdlError {
    fn from(err: RenderError) -> Self {
        let code = err.code();
        match err {
            RenderError::Evaluation(eval) => eval.into(),
            RenderError::Configuration { message, .. } => RdlError::configuration(code, message),
            other => RdlError::system(code, other.to_string()),
        }
    }
}
