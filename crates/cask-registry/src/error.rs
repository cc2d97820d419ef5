//! Error types for the registry crate.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during serialization or catalog import.
///
/// `Network` and `Parse` only ever originate in `CatalogClient`
/// implementations; the store never produces them.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Candidate package rejected: {reason}")]
    #[diagnostic(
        code(cask_registry::validation),
        help("Importers must submit packages with a non-empty owner and repo and well-formed URLs")
    )]
    Validation { reason: String },

    #[error("Failed to fetch from remote catalog: {0}")]
    #[diagnostic(
        code(cask_registry::network),
        help("Check your network connection and the catalog URL")
    )]
    Network(String),

    #[error("Failed to parse catalog response: {0}")]
    #[diagnostic(
        code(cask_registry::parse),
        help("The catalog response may be truncated or in an unexpected format")
    )]
    Parse(String),

    #[error("Invalid URL: {0}")]
    #[diagnostic(code(cask_registry::invalid_url))]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    #[diagnostic(code(cask_registry::store))]
    Store(#[from] cask_db::StoreError),
}

impl RegistryError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::validation("owner must not be empty");
        assert_eq!(
            err.to_string(),
            "Candidate package rejected: owner must not be empty"
        );

        let err = RegistryError::Network("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to fetch from remote catalog: connection refused"
        );
    }
}
