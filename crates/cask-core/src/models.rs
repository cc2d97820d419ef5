//! Entity model for the registry.
//!
//! These are plain value types shared by every store implementation and by
//! the serializer. Identity rules live here as type structure: packages are
//! keyed by a case-sensitive [`PackageId`], releases are tag-unique within
//! their package, aliases are globally unique by short name, and users are
//! unique by both username and API token.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-sensitive `(owner, repo)` identity of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub owner: String,
    pub repo: String,
}

impl PackageId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Where a dependency's contents come from, when pinned to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencySource {
    Url(String),
    Path(String),
}

/// A dependency declared by a package, scoped to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub requirement: String,
    pub source: Option<DependencySource>,
}

/// A package tracked by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub description: String,
    pub topics: Vec<String>,
    pub license: String,
    pub homepage: Option<String>,
    pub source_url: Option<String>,
    pub stars: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub private: bool,
    pub dependencies: Vec<Dependency>,
}

impl Package {
    /// Short name of the package, the `repo` half of its identity.
    pub fn name(&self) -> &str {
        &self.id.repo
    }
}

/// A tagged publication of a package's contents.
///
/// Releases are never hard-deleted; draft and prerelease are soft state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub package: PackageId,
    pub tag: String,
    pub draft: bool,
    pub prerelease: bool,
    pub body: String,
    pub asset_urls: Vec<String>,
    pub size: Option<u64>,
    pub checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A short human-friendly name resolving to a package.
///
/// Aliases are resolved lazily; removing the target package leaves the
/// alias dangling and resolution reports a lookup failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub short_name: String,
    pub target: PackageId,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Key for download accounting: a package, optionally narrowed to one tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadKey {
    pub package: PackageId,
    pub tag: Option<String>,
}

impl DownloadKey {
    pub fn package(package: PackageId) -> Self {
        Self { package, tag: None }
    }

    pub fn release(package: PackageId, tag: impl Into<String>) -> Self {
        Self {
            package,
            tag: Some(tag.into()),
        }
    }
}

impl Display for DownloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}@{}", self.package, tag),
            None => write!(f, "{}", self.package),
        }
    }
}

/// Monotone download counter for one [`DownloadKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadStats {
    pub key: DownloadKey,
    pub count: u64,
    pub last_download: DateTime<Utc>,
}

/// A registered user.
///
/// Users are deactivated rather than deleted so comments and releases keep
/// a valid author reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub api_token: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A comment on a package, optionally a threaded reply.
///
/// Deletion is a tombstone flag so reply threads keep their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub package: PackageId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent: Option<u64>,
    pub deleted: bool,
}
