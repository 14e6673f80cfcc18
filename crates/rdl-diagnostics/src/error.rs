//! Renderer error types

use crate::{ErrorCode, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Rendering cannot proceed
    Error,
    /// A fragment degraded but rendering continued
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with an optional location inside expression text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    /// Span inside the offending expression, when known
    pub span: Option<Span>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic for a terminal, severity in color
    #[cfg(feature = "colored")]
    pub fn to_colored_string(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        let mut out = format!("{}[{}]: {}", severity, self.code, self.message);
        let help = self.help.as_deref().or(self.code.info().help);
        if let Some(help) = help {
            out.push_str(&format!("\n  {} {}", "help:".cyan(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

/// Main renderer error type
#[derive(Debug, Clone, Error)]
pub enum RdlError {
    /// Expression scan/parse error
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        expression: String,
        span: Option<Span>,
    },

    /// Report definition could not be loaded
    #[error("{code}: {message}")]
    Load {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Expression evaluation error that escaped to the caller
    #[error("{code}: {message}")]
    Evaluation {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Fatal configuration error (unregistered data source or sub-report)
    #[error("{code}: {message}")]
    Configuration {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// System error (I/O, data providers)
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<RdlError>),
}

impl RdlError {
    pub fn parse(code: ErrorCode, message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            expression: expression.into(),
            span: None,
        }
    }

    pub fn parse_at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            expression: expression.into(),
            span: Some(span),
        }
    }

    pub fn load(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Load {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn evaluation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Evaluation {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to errors that carry it
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        match &mut self {
            Self::Load { context, .. }
            | Self::Evaluation { context, .. }
            | Self::Configuration { context, .. }
            | Self::System { context, .. } => *context = Some(ctx.into()),
            Self::Parse { .. } | Self::Multiple(_) => {}
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. }
            | Self::Load { code, .. }
            | Self::Evaluation { code, .. }
            | Self::Configuration { code, .. }
            | Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors
                .first()
                .map(|e| e.code())
                .unwrap_or(ErrorCode::new(0)),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse {
                code, message, span, ..
            } => {
                let diag = Diagnostic::error(*code, message.clone());
                match span {
                    Some(span) => diag.with_span(*span),
                    None => diag,
                }
            }
            Self::Load {
                code,
                message,
                context,
            }
            | Self::Evaluation {
                code,
                message,
                context,
            }
            | Self::Configuration {
                code,
                message,
                context,
            }
            | Self::System {
                code,
                message,
                context,
            } => {
                let diag = Diagnostic::error(*code, message.clone());
                match context {
                    Some(ctx) => diag.with_help(ctx.clone()),
                    None => diag,
                }
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => first.to_diagnostic(),
                None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RDL0001, RDL0301};

    #[test]
    fn test_configuration_error() {
        let err = RdlError::configuration(RDL0301, "data source 'Sales' is not registered")
            .with_context("dataset 'Orders'");

        assert!(err.is_configuration());
        assert_eq!(err.code(), RDL0301);
        assert_eq!(err.to_diagnostic().help.as_deref(), Some("dataset 'Orders'"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = RdlError::parse_at(RDL0001, "Unexpected ')'", "=1 + )", Span::new(5, 6))
            .to_diagnostic();

        assert!(diag.to_string().contains("RDL0001"));
        assert!(diag.to_string().contains("5..6"));
    }
}
