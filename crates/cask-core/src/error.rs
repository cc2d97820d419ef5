//! Error types for cask-core.

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by the core value types.
#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Invalid version string: '{0}'")]
    #[diagnostic(
        code(cask_core::invalid_version),
        help("Versions must be exactly three dot-separated non-negative integers, e.g. '1.2.3'")
    )]
    InvalidVersion(String),

    #[error("Validation failed: {0}")]
    #[diagnostic(code(cask_core::validation))]
    Validation(String),
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
