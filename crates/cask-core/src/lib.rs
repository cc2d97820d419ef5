//! Core value types for the cask package registry.
//!
//! This crate defines the entities every other component of the registry
//! operates on: packages and their identity rules, releases, aliases,
//! users, comments, and download accounting, together with the strict
//! three-component [`Version`] type and the API response envelope.
//!
//! Nothing in this crate performs I/O. Storage lives in `cask-db`,
//! serialization and import plumbing in `cask-registry`.

pub mod error;
pub mod models;
pub mod response;
pub mod version;

pub use error::{CoreError, Result};
pub use models::{
    Alias, Comment, Dependency, DependencySource, DownloadKey, DownloadStats, Package, PackageId,
    Release, User,
};
pub use response::ApiResponse;
pub use version::Version;
