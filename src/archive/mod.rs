//! SQLite-backed archive for sealed trails.
//!
//! A trail is persisted as one JSON document, so deleting a trail
//! deletes its entire graph in a single statement (cascade by
//! construction). The archive is stored in `~/.trailgraph/trails.db`.
//!
//! # Design
//!
//! - One row per trail: id, name, created_at, serialized graph
//! - No TTL - trails persist until explicitly deleted
//! - Versioned - auto-clears on version mismatch

use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::model::{Trail, TrailId};

/// Current archive schema version. Bump this when the trail format changes.
const ARCHIVE_VERSION: i32 = 1;

/// Errors that can occur during archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine archive directory")]
    NoArchiveDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Metadata of an archived trail (no graph payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedTrail {
    pub id: TrailId,
    pub name: String,
    pub created_at: i64,
}

/// Archive statistics.
#[derive(Debug, Clone)]
pub struct ArchiveStats {
    /// Number of archived trails.
    pub trail_count: usize,
    /// Total size of all serialized graphs in bytes.
    pub total_size_bytes: usize,
}

/// SQLite-backed trail archive.
pub struct TrailArchive {
    conn: Connection,
}

impl TrailArchive {
    /// Open or create the archive database at the default path.
    ///
    /// If the archive version doesn't match, it's automatically cleared.
    pub fn open() -> ArchiveResult<Self> {
        let path = Self::archive_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let archive = Self { conn };
        archive.init()?;
        Ok(archive)
    }

    /// Open an in-memory archive (for testing).
    pub fn open_in_memory() -> ArchiveResult<Self> {
        let conn = Connection::open_in_memory()?;
        let archive = Self { conn };
        archive.init()?;
        Ok(archive)
    }

    /// Get the path to the archive database.
    pub fn archive_path() -> ArchiveResult<PathBuf> {
        let base = dirs::home_dir().ok_or(ArchiveError::NoArchiveDir)?;
        Ok(base.join(".trailgraph").join("trails.db"))
    }

    /// Initialize the schema and check version.
    fn init(&self) -> ArchiveResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS trails (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                graph TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == ARCHIVE_VERSION => {}
            Some(_) => {
                self.clear_all()?;
                self.set_version()?;
            }
            None => {
                self.set_version()?;
            }
        }

        Ok(())
    }

    fn set_version(&self) -> ArchiveResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![ARCHIVE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Persist a sealed trail, replacing any previous copy.
    pub fn save(&self, trail: &Trail) -> ArchiveResult<()> {
        let graph = serde_json::to_string(trail)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO trails (id, name, created_at, graph) VALUES (?, ?, ?, ?)",
            params![trail.id.to_string(), trail.name, trail.created_at, graph],
        )?;
        Ok(())
    }

    /// Load a trail and rebuild its lookup indexes.
    pub fn load(&self, id: &TrailId) -> ArchiveResult<Option<Trail>> {
        let graph: Option<String> = self
            .conn
            .query_row(
                "SELECT graph FROM trails WHERE id = ?",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match graph {
            Some(json) => {
                let mut trail: Trail = serde_json::from_str(&json)?;
                trail.reindex();
                Ok(Some(trail))
            }
            None => Ok(None),
        }
    }

    /// Delete a trail and its entire graph. Returns true if it existed.
    pub fn delete(&self, id: &TrailId) -> ArchiveResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM trails WHERE id = ?", params![id.to_string()])?;
        Ok(rows > 0)
    }

    /// List archived trails, newest first.
    pub fn list(&self) -> ArchiveResult<Vec<ArchivedTrail>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM trails ORDER BY created_at DESC, id")?;
        let trails = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok((id, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(trails
            .into_iter()
            .filter_map(|(id, name, created_at)| {
                TrailId::parse(&id).map(|id| ArchivedTrail {
                    id,
                    name,
                    created_at,
                })
            })
            .collect())
    }

    /// Remove all archived trails (but keep metadata).
    pub fn clear_all(&self) -> ArchiveResult<()> {
        self.conn.execute("DELETE FROM trails", [])?;
        Ok(())
    }

    /// Get archive statistics.
    pub fn stats(&self) -> ArchiveResult<ArchiveStats> {
        let trail_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM trails", [], |row| row.get(0))?;

        let total_size: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(graph)), 0) FROM trails",
            [],
            |row| row.get(0),
        )?;

        Ok(ArchiveStats {
            trail_count: trail_count as usize,
            total_size_bytes: total_size as usize,
        })
    }
}
