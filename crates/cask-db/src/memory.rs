//! In-memory store implementation.
//!
//! [`MemoryStore`] keeps every collection in maps behind a single
//! `RwLock`: reads proceed concurrently, writers are mutually exclusive,
//! and the download counters are bumped under the write lock so concurrent
//! increments never lose updates. Stored packages keep their topic and
//! license strings interned through [`StringPool`](crate::intern::StringPool)
//! and are materialized back into plain [`Package`] values on read, which
//! also gives callers the snapshot-copy semantics the contract requires.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use cask_core::{
    Alias, Comment, Dependency, DownloadKey, DownloadStats, Package, PackageId, Release, User,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::{IdentityKind, Result, StoreError},
    intern::StringPool,
    store::{matches_query, RegistryStore},
};

/// Internal package representation with interned topic/license strings.
#[derive(Debug, Clone)]
struct StoredPackage {
    id: PackageId,
    description: String,
    topics: Vec<Arc<str>>,
    license: Arc<str>,
    homepage: Option<String>,
    source_url: Option<String>,
    stars: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    private: bool,
    dependencies: Vec<Dependency>,
}

impl StoredPackage {
    fn intern(package: &Package, pool: &mut StringPool) -> Self {
        Self {
            id: package.id.clone(),
            description: package.description.clone(),
            topics: package.topics.iter().map(|t| pool.intern(t)).collect(),
            license: pool.intern(&package.license),
            homepage: package.homepage.clone(),
            source_url: package.source_url.clone(),
            stars: package.stars,
            created_at: package.created_at,
            updated_at: package.updated_at,
            private: package.private,
            dependencies: package.dependencies.clone(),
        }
    }

    fn materialize(&self) -> Package {
        Package {
            id: self.id.clone(),
            description: self.description.clone(),
            topics: self.topics.iter().map(|t| t.to_string()).collect(),
            license: self.license.to_string(),
            homepage: self.homepage.clone(),
            source_url: self.source_url.clone(),
            stars: self.stars,
            created_at: self.created_at,
            updated_at: self.updated_at,
            private: self.private,
            dependencies: self.dependencies.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    packages: HashMap<PackageId, StoredPackage>,
    releases: HashMap<PackageId, Vec<Release>>,
    aliases: HashMap<String, Alias>,
    users: HashMap<String, User>,
    downloads: HashMap<DownloadKey, DownloadStats>,
    comments: Vec<Comment>,
    next_release_id: u64,
    next_comment_id: u64,
    pool: StringPool,
}

/// Lock-based in-process store.
///
/// An explicit value with a constructor, never a process global; tests can
/// hold as many independent stores as they like.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl RegistryStore for MemoryStore {
    fn add_package(&self, package: &Package) -> Result<()> {
        let mut inner = self.write()?;
        if inner.packages.contains_key(&package.id) {
            return Err(StoreError::duplicate(IdentityKind::Package, &package.id));
        }
        debug!(package = %package.id, "adding package");
        let stored = StoredPackage::intern(package, &mut inner.pool);
        inner.packages.insert(package.id.clone(), stored);
        Ok(())
    }

    fn get_package(&self, id: &PackageId) -> Result<Option<Package>> {
        Ok(self.read()?.packages.get(id).map(StoredPackage::materialize))
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        Ok(self
            .read()?
            .packages
            .values()
            .map(StoredPackage::materialize)
            .collect())
    }

    fn search_packages(&self, query: &str) -> Result<Vec<Package>> {
        Ok(self
            .read()?
            .packages
            .values()
            .map(StoredPackage::materialize)
            .filter(|pkg| matches_query(pkg, query))
            .collect())
    }

    fn remove_package(&self, id: &PackageId) -> Result<()> {
        let mut inner = self.write()?;
        if inner.packages.remove(id).is_none() {
            return Err(StoreError::not_found(IdentityKind::Package, id));
        }
        debug!(package = %id, "removed package");
        // Aliases pointing at the removed package stay behind and fail at
        // resolution time.
        Ok(())
    }

    fn add_release(&self, release: &Release) -> Result<u64> {
        let mut inner = self.write()?;
        if !inner.packages.contains_key(&release.package) {
            return Err(StoreError::not_found(IdentityKind::Package, &release.package));
        }
        let tag_taken = inner
            .releases
            .get(&release.package)
            .is_some_and(|existing| existing.iter().any(|r| r.tag == release.tag));
        if tag_taken {
            return Err(StoreError::duplicate(
                IdentityKind::Release,
                format!("{}@{}", release.package, release.tag),
            ));
        }
        inner.next_release_id += 1;
        let id = inner.next_release_id;
        let mut stored = release.clone();
        stored.id = id;
        inner
            .releases
            .entry(release.package.clone())
            .or_default()
            .push(stored);
        debug!(package = %release.package, tag = %release.tag, id, "added release");
        Ok(id)
    }

    fn list_releases(&self, id: &PackageId) -> Result<Vec<Release>> {
        Ok(self.read()?.releases.get(id).cloned().unwrap_or_default())
    }

    fn create_alias(&self, alias: &Alias) -> Result<()> {
        let mut inner = self.write()?;
        if inner.aliases.contains_key(&alias.short_name) {
            return Err(StoreError::duplicate(IdentityKind::Alias, &alias.short_name));
        }
        if !inner.packages.contains_key(&alias.target) {
            return Err(StoreError::not_found(IdentityKind::Package, &alias.target));
        }
        inner
            .aliases
            .insert(alias.short_name.clone(), alias.clone());
        Ok(())
    }

    fn resolve_alias(&self, short_name: &str) -> Result<Package> {
        let inner = self.read()?;
        let alias = inner
            .aliases
            .get(short_name)
            .ok_or_else(|| StoreError::not_found(IdentityKind::Alias, short_name))?;
        inner
            .packages
            .get(&alias.target)
            .map(StoredPackage::materialize)
            .ok_or_else(|| StoreError::not_found(IdentityKind::Package, &alias.target))
    }

    fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.write()?;
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::duplicate(IdentityKind::User, &user.username));
        }
        if inner
            .users
            .values()
            .any(|u| u.api_token == user.api_token)
        {
            return Err(StoreError::duplicate(IdentityKind::User, &user.username));
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn get_user_by_token(&self, token: &str) -> Result<Option<String>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.active && u.api_token == token)
            .map(|u| u.username.clone()))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<String>> {
        Ok(self
            .read()?
            .users
            .get(username)
            .filter(|u| u.active)
            .map(|u| u.password_hash.clone()))
    }

    fn deactivate_user(&self, username: &str) -> Result<()> {
        let mut inner = self.write()?;
        let user = inner
            .users
            .get_mut(username)
            .ok_or_else(|| StoreError::not_found(IdentityKind::User, username))?;
        user.active = false;
        debug!(username, "deactivated user");
        Ok(())
    }

    fn increment_download_count(&self, key: &DownloadKey) -> Result<u64> {
        let mut inner = self.write()?;
        let stats = inner
            .downloads
            .entry(key.clone())
            .or_insert_with(|| DownloadStats {
                key: key.clone(),
                count: 0,
                last_download: Utc::now(),
            });
        stats.count += 1;
        stats.last_download = Utc::now();
        Ok(stats.count)
    }

    fn get_download_count(&self, key: &DownloadKey) -> Result<u64> {
        Ok(self
            .read()?
            .downloads
            .get(key)
            .map(|stats| stats.count)
            .unwrap_or(0))
    }

    fn add_comment(&self, comment: &Comment) -> Result<u64> {
        let mut inner = self.write()?;
        if !inner.packages.contains_key(&comment.package) {
            return Err(StoreError::not_found(IdentityKind::Package, &comment.package));
        }
        if let Some(parent) = comment.parent {
            let parent_ok = inner
                .comments
                .iter()
                .any(|c| c.id == parent && c.package == comment.package);
            if !parent_ok {
                return Err(StoreError::not_found(IdentityKind::Comment, parent));
            }
        }
        inner.next_comment_id += 1;
        let id = inner.next_comment_id;
        let mut stored = comment.clone();
        stored.id = id;
        inner.comments.push(stored);
        Ok(id)
    }

    fn delete_comment(&self, id: u64) -> Result<()> {
        let mut inner = self.write()?;
        let comment = inner
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(IdentityKind::Comment, id))?;
        comment.deleted = true;
        Ok(())
    }

    fn list_comments(&self, id: &PackageId) -> Result<Vec<Comment>> {
        Ok(self
            .read()?
            .comments
            .iter()
            .filter(|c| &c.package == id)
            .cloned()
            .collect())
    }

    fn total_packages(&self) -> Result<u64> {
        Ok(self.read()?.packages.len() as u64)
    }

    fn total_downloads(&self) -> Result<u64> {
        Ok(self.read()?.downloads.values().map(|s| s.count).sum())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::store::test_fixtures::{package, release, user};

    #[test]
    fn test_add_get_remove_package() {
        let store = MemoryStore::new();
        let pkg = package("mlugg", "zig-clap", "command line argument parsing");

        store.add_package(&pkg).unwrap();
        let found = store.get_package(&pkg.id).unwrap();
        assert_eq!(found, Some(pkg.clone()));

        store.remove_package(&pkg.id).unwrap();
        assert_eq!(store.get_package(&pkg.id).unwrap(), None);
        assert!(store.remove_package(&pkg.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_package_leaves_store_unchanged() {
        let store = MemoryStore::new();
        let original = package("alice", "pkg", "first description");
        store.add_package(&original).unwrap();

        let mut replacement = package("alice", "pkg", "second description");
        replacement.stars = 99;
        let err = store.add_package(&replacement).unwrap_err();
        assert!(err.is_duplicate());

        assert_eq!(store.get_package(&original.id).unwrap(), Some(original));
        assert_eq!(store.total_packages().unwrap(), 1);
    }

    #[test]
    fn test_search_containment() {
        let store = MemoryStore::new();
        store
            .add_package(&package("a", "zig-clap", "argument parsing"))
            .unwrap();
        store
            .add_package(&package("b", "zig-json", "JSON parsing"))
            .unwrap();
        store
            .add_package(&package("c", "http-server", "web things"))
            .unwrap();

        let hits = store.search_packages("parsing").unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search_packages("zig-clap").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "zig-clap");

        // Case-sensitive: "Parsing" matches nothing.
        assert!(store.search_packages("Parsing").unwrap().is_empty());

        // Empty query matches everything.
        assert_eq!(store.search_packages("").unwrap().len(), 3);
    }

    #[test]
    fn test_release_tag_unique_per_package() {
        let store = MemoryStore::new();
        let pkg = package("alice", "pkg", "");
        store.add_package(&pkg).unwrap();

        let first = store.add_release(&release(&pkg.id, "v0.6.0")).unwrap();
        let second = store.add_release(&release(&pkg.id, "v0.7.0")).unwrap();
        assert_ne!(first, second);

        let err = store.add_release(&release(&pkg.id, "v0.6.0")).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.list_releases(&pkg.id).unwrap().len(), 2);

        // Same tag under a different package is fine.
        let other = package("bob", "pkg", "");
        store.add_package(&other).unwrap();
        store.add_release(&release(&other.id, "v0.6.0")).unwrap();
    }

    #[test]
    fn test_release_requires_package() {
        let store = MemoryStore::new();
        let missing = PackageId::new("ghost", "pkg");
        let err = store.add_release(&release(&missing, "v1.0.0")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_alias_resolution_and_dangling() {
        let store = MemoryStore::new();
        let pkg = package("mlugg", "zig-clap", "");
        store.add_package(&pkg).unwrap();

        let alias = Alias {
            short_name: "clap".to_string(),
            target: pkg.id.clone(),
            created_at: Utc::now(),
            created_by: "admin".to_string(),
        };
        store.create_alias(&alias).unwrap();
        assert_eq!(store.resolve_alias("clap").unwrap().id, pkg.id);

        assert!(store.create_alias(&alias).unwrap_err().is_duplicate());
        assert!(store.resolve_alias("nope").unwrap_err().is_not_found());

        // Removing the target leaves the alias dangling, not stale.
        store.remove_package(&pkg.id).unwrap();
        assert!(store.resolve_alias("clap").unwrap_err().is_not_found());
    }

    #[test]
    fn test_alias_target_must_exist() {
        let store = MemoryStore::new();
        let alias = Alias {
            short_name: "clap".to_string(),
            target: PackageId::new("ghost", "pkg"),
            created_at: Utc::now(),
            created_by: "admin".to_string(),
        };
        assert!(store.create_alias(&alias).unwrap_err().is_not_found());
    }

    #[test]
    fn test_user_token_lifecycle() {
        let store = MemoryStore::new();
        store
            .create_user(&user("alice", "a@x.com", "hash1", "tok1"))
            .unwrap();

        assert_eq!(
            store.get_user_by_token("tok1").unwrap(),
            Some("alice".to_string())
        );
        assert_eq!(
            store.get_user_by_username("alice").unwrap(),
            Some("hash1".to_string())
        );

        store.deactivate_user("alice").unwrap();
        assert_eq!(store.get_user_by_token("tok1").unwrap(), None);
        assert_eq!(store.get_user_by_username("alice").unwrap(), None);

        assert!(store.deactivate_user("nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_user_identity_collisions() {
        let store = MemoryStore::new();
        store
            .create_user(&user("alice", "a@x.com", "hash1", "tok1"))
            .unwrap();

        let err = store
            .create_user(&user("alice", "other@x.com", "hash2", "tok2"))
            .unwrap_err();
        assert!(err.is_duplicate());

        // Tokens are an identity too.
        let err = store
            .create_user(&user("bob", "b@x.com", "hash3", "tok1"))
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_download_counts() {
        let store = MemoryStore::new();
        let key = DownloadKey::package(PackageId::new("alice", "pkg"));

        assert_eq!(store.get_download_count(&key).unwrap(), 0);
        for expected in 1..=5 {
            assert_eq!(store.increment_download_count(&key).unwrap(), expected);
        }
        assert_eq!(store.get_download_count(&key).unwrap(), 5);

        let tagged = DownloadKey::release(PackageId::new("alice", "pkg"), "v1.0.0");
        store.increment_download_count(&tagged).unwrap();
        assert_eq!(store.get_download_count(&tagged).unwrap(), 1);
        assert_eq!(store.total_downloads().unwrap(), 6);
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        let store = Arc::new(MemoryStore::new());
        let key = DownloadKey::package(PackageId::new("alice", "pkg"));
        let threads: u64 = 16;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                thread::spawn(move || store.increment_download_count(&key).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_download_count(&key).unwrap(), threads);
    }

    #[test]
    fn test_comment_thread_tombstones() {
        let store = MemoryStore::new();
        let pkg = package("alice", "pkg", "");
        store.add_package(&pkg).unwrap();

        let root = Comment {
            id: 0,
            package: pkg.id.clone(),
            author: "bob".to_string(),
            content: "nice package".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            parent: None,
            deleted: false,
        };
        let root_id = store.add_comment(&root).unwrap();

        let reply = Comment {
            parent: Some(root_id),
            content: "agreed".to_string(),
            ..root.clone()
        };
        let reply_id = store.add_comment(&reply).unwrap();
        assert_ne!(root_id, reply_id);

        store.delete_comment(root_id).unwrap();
        let comments = store.list_comments(&pkg.id).unwrap();
        assert_eq!(comments.len(), 2);
        let deleted = comments.iter().find(|c| c.id == root_id).unwrap();
        assert!(deleted.deleted);
        let kept = comments.iter().find(|c| c.id == reply_id).unwrap();
        assert_eq!(kept.parent, Some(root_id));

        // Replies must reference a real comment on the same package.
        let bad_reply = Comment {
            parent: Some(999),
            ..root
        };
        assert!(store.add_comment(&bad_reply).unwrap_err().is_not_found());
    }

    #[test]
    fn test_interning_shares_repeated_topics() {
        let store = MemoryStore::new();
        for n in 0..10 {
            let mut pkg = package("alice", &format!("pkg-{n}"), "");
            pkg.topics = vec!["zig".to_string(), "cli".to_string()];
            pkg.license = "MIT".to_string();
            store.add_package(&pkg).unwrap();
        }
        let inner = store.inner.read().unwrap();
        assert_eq!(inner.pool.len(), 3);
    }
}
