//! The store contract.
//!
//! [`RegistryStore`] is the seam between the registry core and any storage
//! backend. Callers hold a store behind `Arc<dyn RegistryStore>` and must
//! not depend on which implementation answers; the in-memory and SQLite
//! stores satisfy exactly the same contract and are interchangeable.

use cask_core::{Alias, Comment, DownloadKey, Package, PackageId, Release, User};

use crate::error::Result;

/// The mutation/query engine over the registry's entities.
///
/// Semantics every implementation must uphold:
///
/// - Mutations are atomic: either the full effect lands or none of it does,
///   and a successful mutation is visible to subsequent reads in program
///   order.
/// - Identity violations and lookup misses come back as typed errors
///   ([`StoreError::DuplicateIdentity`], [`StoreError::NotFound`]); no
///   operation panics on caller-supplied data.
/// - Download counters are monotone. Concurrent increments must never lose
///   updates.
/// - Listing operations return snapshot copies. Iteration order is not a
///   contract; callers needing deterministic order sort explicitly.
///
/// [`StoreError::DuplicateIdentity`]: crate::StoreError::DuplicateIdentity
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
pub trait RegistryStore: Send + Sync {
    /// Inserts a package. Fails with `DuplicateIdentity` if the
    /// `(owner, repo)` pair is already present.
    fn add_package(&self, package: &Package) -> Result<()>;

    /// Looks up a package by identity. Pure, no side effects.
    fn get_package(&self, id: &PackageId) -> Result<Option<Package>>;

    /// Returns a snapshot of all packages.
    fn list_packages(&self) -> Result<Vec<Package>>;

    /// Returns the packages whose name or description contains `query` as
    /// a case-sensitive substring. An empty query matches everything.
    fn search_packages(&self, query: &str) -> Result<Vec<Package>>;

    /// Removes a package. Aliases pointing at it are left dangling and
    /// fail at resolution time rather than being eagerly cleaned up.
    fn remove_package(&self, id: &PackageId) -> Result<()>;

    /// Records a release for an existing package and returns its assigned
    /// id. The tag must be unique within the owning package.
    fn add_release(&self, release: &Release) -> Result<u64>;

    /// Returns all releases of a package, tombstoned drafts included.
    fn list_releases(&self, id: &PackageId) -> Result<Vec<Release>>;

    /// Registers an alias. The target package must exist at creation time
    /// and the short name must be globally unused.
    fn create_alias(&self, alias: &Alias) -> Result<()>;

    /// Resolves an alias to its live target package. Unknown aliases and
    /// aliases whose target was removed both report `NotFound`.
    fn resolve_alias(&self, short_name: &str) -> Result<Package>;

    /// Registers a user. Usernames and API tokens are both unique keys.
    fn create_user(&self, user: &User) -> Result<()>;

    /// Resolves an API token to a username. Inactive users never match.
    fn get_user_by_token(&self, token: &str) -> Result<Option<String>>;

    /// Returns the password hash for an active user, for credential
    /// verification by the caller. Inactive users never match.
    fn get_user_by_username(&self, username: &str) -> Result<Option<String>>;

    /// Deactivates a user. The record is kept so comments and releases
    /// retain a valid author reference, but credential lookups stop
    /// matching.
    fn deactivate_user(&self, username: &str) -> Result<()>;

    /// Atomically bumps the download counter for `key`, creating it at 1,
    /// and returns the new count.
    fn increment_download_count(&self, key: &DownloadKey) -> Result<u64>;

    /// Returns the download count for `key`, 0 if never incremented.
    fn get_download_count(&self, key: &DownloadKey) -> Result<u64>;

    /// Adds a comment to an existing package and returns its assigned id.
    /// A `parent` id, when present, must name an existing comment on the
    /// same package.
    fn add_comment(&self, comment: &Comment) -> Result<u64>;

    /// Tombstones a comment, preserving thread structure.
    fn delete_comment(&self, id: u64) -> Result<()>;

    /// Returns all comments on a package, tombstones included.
    fn list_comments(&self, id: &PackageId) -> Result<Vec<Comment>>;

    /// Number of packages currently in the store.
    fn total_packages(&self) -> Result<u64>;

    /// Sum of all download counters.
    fn total_downloads(&self) -> Result<u64>;
}

/// The search predicate shared by every implementation: case-sensitive
/// substring containment against the package name and description.
pub(crate) fn matches_query(package: &Package, query: &str) -> bool {
    package.name().contains(query) || package.description.contains(query)
}
