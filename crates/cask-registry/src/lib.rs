//! Metadata serialization and catalog import for the cask package registry.
//!
//! This crate covers the two seams between the storage core and the outside
//! world:
//!
//! - **Serialization**: [`PackageMetadata`] renders a package into its
//!   canonical JSON text form, buffered or streamed, with a fixed field
//!   order (the shape served to clients and written into registries).
//! - **Import**: [`CatalogClient`] is the contract external catalog
//!   importers implement; [`ImportAdapter`] drives a whole import run and
//!   [`submit`] performs the single validate-then-add step for one
//!   candidate package.
//!
//! The crate never fetches anything itself. Network retries, rate-limit
//! backoff and catalog pagination belong to the `CatalogClient`
//! implementations.

pub mod error;
pub mod import;
pub mod metadata;

pub use error::{RegistryError, Result};
pub use import::{submit, CatalogClient, FixedCatalog, ImportAdapter, ImportSummary};
pub use metadata::PackageMetadata;
