//! Catalog import: the contract external importers use to feed the store.
//!
//! An importer is anything that can produce candidate [`Package`] records
//! from a remote catalog. The core only defines the seam: a
//! [`CatalogClient`] fetches candidates (and owns its retries and backoff),
//! [`submit`] validates one candidate and performs a single atomic
//! add-or-reject against the store, and [`ImportAdapter`] drives a whole
//! run, one package at a time, so a long import interleaves safely with
//! live traffic.

use cask_core::Package;
use cask_db::RegistryStore;
use tracing::{debug, warn};
use url::Url;

use crate::error::{RegistryError, Result};

/// A source of candidate packages.
///
/// One implementation per real catalog backend; [`FixedCatalog`] is the
/// test double.
pub trait CatalogClient {
    /// Fetches the current candidate packages from the catalog.
    ///
    /// Implementations are responsible for network retries and rate-limit
    /// backoff; errors surface as [`RegistryError::Network`] or
    /// [`RegistryError::Parse`].
    fn fetch_packages(&self) -> Result<Vec<Package>>;
}

/// Test double returning a fixed set of candidates.
#[derive(Debug, Default)]
pub struct FixedCatalog {
    packages: Vec<Package>,
}

impl FixedCatalog {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }
}

impl CatalogClient for FixedCatalog {
    fn fetch_packages(&self) -> Result<Vec<Package>> {
        Ok(self.packages.clone())
    }
}

/// Checks the required-field rules a candidate must satisfy before it may
/// enter the store.
fn validate(package: &Package) -> Result<()> {
    if package.id.owner.is_empty() {
        return Err(RegistryError::validation("owner must not be empty"));
    }
    if package.id.repo.is_empty() {
        return Err(RegistryError::validation("repo must not be empty"));
    }
    if package.id.owner.contains('/') || package.id.repo.contains('/') {
        return Err(RegistryError::validation(
            "owner and repo must not contain '/'",
        ));
    }
    if let Some(homepage) = &package.homepage {
        Url::parse(homepage)?;
    }
    if let Some(source_url) = &package.source_url {
        Url::parse(source_url)?;
    }
    Ok(())
}

/// Submits one candidate package: validate, then a single atomic
/// add-or-reject.
///
/// Identity collisions pass through as
/// [`StoreError::DuplicateIdentity`](cask_db::StoreError::DuplicateIdentity)
/// wrapped in [`RegistryError::Store`]; the store is left untouched on any
/// failure.
pub fn submit(store: &dyn RegistryStore, package: &Package) -> Result<()> {
    validate(package)?;
    store.add_package(package)?;
    debug!(package = %package.id, "imported package");
    Ok(())
}

/// Outcome counts for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Candidates accepted into the store.
    pub submitted: usize,
    /// Candidates skipped because their identity already exists.
    pub duplicates: usize,
    /// Candidates rejected by validation.
    pub rejected: usize,
}

/// Drives an import run from one catalog into one store.
pub struct ImportAdapter<C: CatalogClient> {
    client: C,
}

impl<C: CatalogClient> ImportAdapter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetches candidates and submits them one at a time.
    ///
    /// A duplicate or invalid candidate is counted and skipped, never
    /// aborting the run; store-level failures (e.g. a broken database)
    /// do abort, since every following submission would fail the same way.
    pub fn run(&self, store: &dyn RegistryStore) -> Result<ImportSummary> {
        let candidates = self.client.fetch_packages()?;
        debug!(count = candidates.len(), "fetched catalog candidates");

        let mut summary = ImportSummary::default();
        for package in &candidates {
            match submit(store, package) {
                Ok(()) => summary.submitted += 1,
                Err(RegistryError::Store(err)) if err.is_duplicate() => {
                    debug!(package = %package.id, "skipping duplicate");
                    summary.duplicates += 1;
                }
                Err(RegistryError::Validation { reason }) => {
                    warn!(package = %package.id, reason = %reason, "rejecting candidate");
                    summary.rejected += 1;
                }
                Err(RegistryError::InvalidUrl(err)) => {
                    warn!(package = %package.id, error = %err, "rejecting candidate");
                    summary.rejected += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use cask_core::PackageId;
    use cask_db::MemoryStore;
    use chrono::Utc;

    use super::*;

    fn candidate(owner: &str, repo: &str) -> Package {
        Package {
            id: PackageId::new(owner, repo),
            description: "a package".to_string(),
            topics: Vec::new(),
            license: "MIT".to_string(),
            homepage: None,
            source_url: None,
            stars: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            private: false,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_submit_valid() {
        let store = MemoryStore::new();
        let pkg = candidate("mlugg", "zig-clap");
        submit(&store, &pkg).unwrap();
        assert_eq!(store.get_package(&pkg.id).unwrap(), Some(pkg));
    }

    #[test]
    fn test_submit_rejects_missing_fields() {
        let store = MemoryStore::new();
        let err = submit(&store, &candidate("", "pkg")).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { .. }));

        let err = submit(&store, &candidate("alice", "")).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { .. }));

        let err = submit(&store, &candidate("al/ice", "pkg")).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { .. }));
        assert_eq!(store.total_packages().unwrap(), 0);
    }

    #[test]
    fn test_submit_rejects_bad_urls() {
        let store = MemoryStore::new();
        let mut pkg = candidate("alice", "pkg");
        pkg.homepage = Some("not a url".to_string());
        let err = submit(&store, &pkg).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl(_)));
    }

    #[test]
    fn test_submit_duplicate_passes_through() {
        let store = MemoryStore::new();
        let pkg = candidate("alice", "pkg");
        submit(&store, &pkg).unwrap();
        let err = submit(&store, &pkg).unwrap_err();
        match err {
            RegistryError::Store(err) => assert!(err.is_duplicate()),
            other => panic!("expected store error, got {other}"),
        }
    }

    #[test]
    fn test_adapter_run_counts_outcomes() {
        let store = MemoryStore::new();
        // Pre-existing package, to be reported as a duplicate.
        store.add_package(&candidate("alice", "existing")).unwrap();

        let mut bad_url = candidate("carol", "bad-url");
        bad_url.homepage = Some("::not-a-url::".to_string());
        let catalog = FixedCatalog::new(vec![
            candidate("alice", "existing"),
            candidate("bob", "fresh"),
            candidate("", "no-owner"),
            bad_url,
            candidate("dave", "another"),
        ]);

        let summary = ImportAdapter::new(catalog).run(&store).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                submitted: 2,
                duplicates: 1,
                rejected: 2,
            }
        );
        assert_eq!(store.total_packages().unwrap(), 3);
        assert!(store
            .get_package(&PackageId::new("bob", "fresh"))
            .unwrap()
            .is_some());
    }
}
