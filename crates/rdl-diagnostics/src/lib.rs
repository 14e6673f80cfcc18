//! RDL diagnostics and error handling
//!
//! Error codes, source spans inside expression text, and the shared
//! [`RdlError`] type every crate of the renderer converges on.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, RdlError>;
