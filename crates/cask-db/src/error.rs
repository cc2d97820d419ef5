//! Error types for store operations.
//!
//! Identity violations and lookup misses are typed results, never panics;
//! the serving layer decides how they map to user-facing responses.

use miette::Diagnostic;
use thiserror::Error;

/// Which unique-keyed entity an identity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Package,
    Release,
    Alias,
    User,
    Comment,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IdentityKind::Package => "package",
            IdentityKind::Release => "release",
            IdentityKind::Alias => "alias",
            IdentityKind::User => "user",
            IdentityKind::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during store operations.
#[derive(Error, Diagnostic, Debug)]
pub enum StoreError {
    #[error("{kind} '{key}' already exists")]
    #[diagnostic(
        code(cask_db::duplicate_identity),
        help("Unique keys are never reused; pick a different identity")
    )]
    DuplicateIdentity { kind: IdentityKind, key: String },

    #[error("{kind} '{key}' not found")]
    #[diagnostic(code(cask_db::not_found))]
    NotFound { kind: IdentityKind, key: String },

    #[error("Credential does not match an active user")]
    #[diagnostic(code(cask_db::unauthorized))]
    Unauthorized,

    #[error(transparent)]
    #[diagnostic(
        code(cask_db::sqlite),
        help("The database file may be corrupted or locked by another process")
    )]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned by a panicked writer")]
    #[diagnostic(
        code(cask_db::poison),
        help("This is an internal error, please report it")
    )]
    LockPoisoned,
}

impl StoreError {
    pub fn duplicate(kind: IdentityKind, key: impl std::fmt::Display) -> Self {
        Self::DuplicateIdentity {
            kind,
            key: key.to_string(),
        }
    }

    pub fn not_found(kind: IdentityKind, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Whether this error is a unique-key violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateIdentity { .. })
    }

    /// Whether this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A specialized Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::duplicate(IdentityKind::Package, "alice/pkg");
        assert_eq!(err.to_string(), "package 'alice/pkg' already exists");
        assert!(err.is_duplicate());

        let err = StoreError::not_found(IdentityKind::Alias, "clap");
        assert_eq!(err.to_string(), "alias 'clap' not found");
        assert!(err.is_not_found());
    }
}
