//! SQLite-backed store implementation.
//!
//! [`SqliteStore`] satisfies the same [`RegistryStore`] contract as the
//! in-memory store, persisting to a single SQLite database. The schema is
//! created by an idempotent migration on open, so pointing the store at an
//! existing database file resumes where it left off.
//!
//! One connection is shared behind a `Mutex`; SQLite serializes writers
//! anyway, and the coarse lock keeps check-then-insert sequences atomic
//! without explicit transactions.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use cask_core::{Alias, Comment, DownloadKey, Package, PackageId, Release, User};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::{
    error::{IdentityKind, Result, StoreError},
    helpers::{from_json, to_json},
    store::{matches_query, RegistryStore},
    traits::FromRow,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS packages (
    owner        TEXT NOT NULL,
    repo         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    topics       TEXT NOT NULL DEFAULT '[]',
    license      TEXT NOT NULL DEFAULT '',
    homepage     TEXT,
    source_url   TEXT,
    stars        INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    private      INTEGER NOT NULL DEFAULT 0,
    dependencies TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (owner, repo)
);
CREATE TABLE IF NOT EXISTS releases (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    owner        TEXT NOT NULL,
    repo         TEXT NOT NULL,
    tag          TEXT NOT NULL,
    draft        INTEGER NOT NULL DEFAULT 0,
    prerelease   INTEGER NOT NULL DEFAULT 0,
    body         TEXT NOT NULL DEFAULT '',
    asset_urls   TEXT NOT NULL DEFAULT '[]',
    size         INTEGER,
    checksum     TEXT,
    created_at   TEXT NOT NULL,
    published_at TEXT,
    UNIQUE (owner, repo, tag)
);
CREATE TABLE IF NOT EXISTS aliases (
    short_name TEXT PRIMARY KEY,
    owner      TEXT NOT NULL,
    repo       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    created_by TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    username      TEXT PRIMARY KEY,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    api_token     TEXT NOT NULL UNIQUE,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS downloads (
    owner         TEXT NOT NULL,
    repo          TEXT NOT NULL,
    tag           TEXT NOT NULL DEFAULT '',
    count         INTEGER NOT NULL DEFAULT 0,
    last_download TEXT NOT NULL,
    PRIMARY KEY (owner, repo, tag)
);
CREATE TABLE IF NOT EXISTS comments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    owner      TEXT NOT NULL,
    repo       TEXT NOT NULL,
    author     TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    parent     INTEGER,
    deleted    INTEGER NOT NULL DEFAULT 0
);
";

impl FromRow for Package {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: PackageId::new(
                row.get::<_, String>("owner")?,
                row.get::<_, String>("repo")?,
            ),
            description: row.get("description")?,
            topics: from_json(row.get("topics")?),
            license: row.get("license")?,
            homepage: row.get("homepage")?,
            source_url: row.get("source_url")?,
            stars: row.get("stars")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            private: row.get("private")?,
            dependencies: from_json(row.get("dependencies")?),
        })
    }
}

impl FromRow for Release {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            package: PackageId::new(
                row.get::<_, String>("owner")?,
                row.get::<_, String>("repo")?,
            ),
            tag: row.get("tag")?,
            draft: row.get("draft")?,
            prerelease: row.get("prerelease")?,
            body: row.get("body")?,
            asset_urls: from_json(row.get("asset_urls")?),
            size: row.get("size")?,
            checksum: row.get("checksum")?,
            created_at: row.get("created_at")?,
            published_at: row.get("published_at")?,
        })
    }
}

impl FromRow for Alias {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            short_name: row.get("short_name")?,
            target: PackageId::new(
                row.get::<_, String>("owner")?,
                row.get::<_, String>("repo")?,
            ),
            created_at: row.get("created_at")?,
            created_by: row.get("created_by")?,
        })
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            api_token: row.get("api_token")?,
            active: row.get("active")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl FromRow for Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            package: PackageId::new(
                row.get::<_, String>("owner")?,
                row.get::<_, String>("repo")?,
            ),
            author: row.get("author")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            parent: row.get("parent")?,
            deleted: row.get("deleted")?,
        })
    }
}

/// Durable store over a single SQLite database.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and applies migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a fresh in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.execute_batch(SCHEMA)?;
        debug!("sqlite store ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn package_exists(conn: &Connection, id: &PackageId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM packages WHERE owner = ?1 AND repo = ?2)",
        params![id.owner, id.repo],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn get_package_with(conn: &Connection, id: &PackageId) -> Result<Option<Package>> {
    let package = conn
        .query_row(
            "SELECT * FROM packages WHERE owner = ?1 AND repo = ?2",
            params![id.owner, id.repo],
            Package::from_row,
        )
        .optional()?;
    Ok(package)
}

// The optional release tag is stored as '' so it can take part in the
// downloads primary key; NULLs are distinct in SQLite primary keys.
fn tag_column(key: &DownloadKey) -> &str {
    key.tag.as_deref().unwrap_or("")
}

impl RegistryStore for SqliteStore {
    fn add_package(&self, package: &Package) -> Result<()> {
        let conn = self.conn()?;
        if package_exists(&conn, &package.id)? {
            return Err(StoreError::duplicate(IdentityKind::Package, &package.id));
        }
        debug!(package = %package.id, "adding package");
        conn.execute(
            "INSERT INTO packages (owner, repo, description, topics, license, homepage,
                source_url, stars, created_at, updated_at, private, dependencies)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                package.id.owner,
                package.id.repo,
                package.description,
                to_json(&package.topics),
                package.license,
                package.homepage,
                package.source_url,
                package.stars,
                package.created_at,
                package.updated_at,
                package.private,
                to_json(&package.dependencies),
            ],
        )?;
        Ok(())
    }

    fn get_package(&self, id: &PackageId) -> Result<Option<Package>> {
        let conn = self.conn()?;
        get_package_with(&conn, id)
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM packages")?;
        let packages = stmt
            .query_map([], Package::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(packages)
    }

    fn search_packages(&self, query: &str) -> Result<Vec<Package>> {
        // SQLite LIKE is case-insensitive for ASCII; filtering in Rust keeps
        // the substring semantics identical to the in-memory store.
        Ok(self
            .list_packages()?
            .into_iter()
            .filter(|pkg| matches_query(pkg, query))
            .collect())
    }

    fn remove_package(&self, id: &PackageId) -> Result<()> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM packages WHERE owner = ?1 AND repo = ?2",
            params![id.owner, id.repo],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(IdentityKind::Package, id));
        }
        debug!(package = %id, "removed package");
        Ok(())
    }

    fn add_release(&self, release: &Release) -> Result<u64> {
        let conn = self.conn()?;
        if !package_exists(&conn, &release.package)? {
            return Err(StoreError::not_found(IdentityKind::Package, &release.package));
        }
        let tag_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM releases WHERE owner = ?1 AND repo = ?2 AND tag = ?3)",
            params![release.package.owner, release.package.repo, release.tag],
            |row| row.get(0),
        )?;
        if tag_taken {
            return Err(StoreError::duplicate(
                IdentityKind::Release,
                format!("{}@{}", release.package, release.tag),
            ));
        }
        conn.execute(
            "INSERT INTO releases (owner, repo, tag, draft, prerelease, body, asset_urls,
                size, checksum, created_at, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                release.package.owner,
                release.package.repo,
                release.tag,
                release.draft,
                release.prerelease,
                release.body,
                to_json(&release.asset_urls),
                release.size,
                release.checksum,
                release.created_at,
                release.published_at,
            ],
        )?;
        let id = conn.last_insert_rowid() as u64;
        debug!(package = %release.package, tag = %release.tag, id, "added release");
        Ok(id)
    }

    fn list_releases(&self, id: &PackageId) -> Result<Vec<Release>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM releases WHERE owner = ?1 AND repo = ?2 ORDER BY id")?;
        let releases = stmt
            .query_map(params![id.owner, id.repo], Release::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(releases)
    }

    fn create_alias(&self, alias: &Alias) -> Result<()> {
        let conn = self.conn()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM aliases WHERE short_name = ?1)",
            params![alias.short_name],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::duplicate(IdentityKind::Alias, &alias.short_name));
        }
        if !package_exists(&conn, &alias.target)? {
            return Err(StoreError::not_found(IdentityKind::Package, &alias.target));
        }
        conn.execute(
            "INSERT INTO aliases (short_name, owner, repo, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                alias.short_name,
                alias.target.owner,
                alias.target.repo,
                alias.created_at,
                alias.created_by,
            ],
        )?;
        Ok(())
    }

    fn resolve_alias(&self, short_name: &str) -> Result<Package> {
        let conn = self.conn()?;
        let alias = conn
            .query_row(
                "SELECT * FROM aliases WHERE short_name = ?1",
                params![short_name],
                Alias::from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(IdentityKind::Alias, short_name))?;
        get_package_with(&conn, &alias.target)?
            .ok_or_else(|| StoreError::not_found(IdentityKind::Package, &alias.target))
    }

    fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR api_token = ?2)",
            params![user.username, user.api_token],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::duplicate(IdentityKind::User, &user.username));
        }
        conn.execute(
            "INSERT INTO users (username, email, password_hash, api_token, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.api_token,
                user.active,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_user_by_token(&self, token: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let username = conn
            .query_row(
                "SELECT username FROM users WHERE api_token = ?1 AND active = 1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(username)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?1 AND active = 1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn deactivate_user(&self, username: &str) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET active = 0 WHERE username = ?1",
            params![username],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(IdentityKind::User, username));
        }
        debug!(username, "deactivated user");
        Ok(())
    }

    fn increment_download_count(&self, key: &DownloadKey) -> Result<u64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "INSERT INTO downloads (owner, repo, tag, count, last_download)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT (owner, repo, tag)
             DO UPDATE SET count = count + 1, last_download = excluded.last_download
             RETURNING count",
            params![
                key.package.owner,
                key.package.repo,
                tag_column(key),
                chrono::Utc::now(),
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn get_download_count(&self, key: &DownloadKey) -> Result<u64> {
        let conn = self.conn()?;
        let count = conn
            .query_row(
                "SELECT count FROM downloads WHERE owner = ?1 AND repo = ?2 AND tag = ?3",
                params![key.package.owner, key.package.repo, tag_column(key)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    fn add_comment(&self, comment: &Comment) -> Result<u64> {
        let conn = self.conn()?;
        if !package_exists(&conn, &comment.package)? {
            return Err(StoreError::not_found(IdentityKind::Package, &comment.package));
        }
        if let Some(parent) = comment.parent {
            let parent_ok: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1 AND owner = ?2 AND repo = ?3)",
                params![parent, comment.package.owner, comment.package.repo],
                |row| row.get(0),
            )?;
            if !parent_ok {
                return Err(StoreError::not_found(IdentityKind::Comment, parent));
            }
        }
        conn.execute(
            "INSERT INTO comments (owner, repo, author, content, created_at, updated_at,
                parent, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                comment.package.owner,
                comment.package.repo,
                comment.author,
                comment.content,
                comment.created_at,
                comment.updated_at,
                comment.parent,
                comment.deleted,
            ],
        )?;
        Ok(conn.last_insert_rowid() as u64)
    }

    fn delete_comment(&self, id: u64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute("UPDATE comments SET deleted = 1 WHERE id = ?1", params![id])?;
        if updated == 0 {
            return Err(StoreError::not_found(IdentityKind::Comment, id));
        }
        Ok(())
    }

    fn list_comments(&self, id: &PackageId) -> Result<Vec<Comment>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM comments WHERE owner = ?1 AND repo = ?2 ORDER BY id")?;
        let comments = stmt
            .query_map(params![id.owner, id.repo], Comment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    fn total_packages(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        Ok(count)
    }

    fn total_downloads(&self) -> Result<u64> {
        let conn = self.conn()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM downloads",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
