//! Store implementations for the cask package registry.
//!
//! The [`RegistryStore`] trait is the contract every store satisfies; two
//! interchangeable implementations ship here:
//!
//! - [`MemoryStore`]: lock-based in-process maps, suited to tests and
//!   single-node deployments without durability needs.
//! - [`SqliteStore`]: rusqlite-backed durable store with the same external
//!   behavior.
//!
//! Stores are explicit values with an open/constructor lifecycle, never
//! process globals, so multiple instances can coexist in one process.
//!
//! # Example
//!
//! ```
//! use cask_db::{MemoryStore, RegistryStore};
//! use cask_core::{DownloadKey, PackageId};
//!
//! let store = MemoryStore::new();
//! let key = DownloadKey::package(PackageId::new("mlugg", "zig-clap"));
//! store.increment_download_count(&key).unwrap();
//! assert_eq!(store.get_download_count(&key).unwrap(), 1);
//! ```

pub mod error;
pub mod helpers;
pub mod intern;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod traits;

pub use error::{IdentityKind, Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::RegistryStore;
pub use traits::FromRow;
