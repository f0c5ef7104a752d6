//! Persistent SQLite pool and the no-op pool.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::{validate_key, CacheItem, CacheItemPool};
use crate::error::StoreError;

/// Pool that never stores anything.
/// Used when caching is disabled - every lookup misses, saves are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidPool;

impl CacheItemPool for VoidPool {
  fn get_item(&self, key: &str) -> Result<CacheItem, StoreError> {
    validate_key(key)?;
    Ok(CacheItem::miss(key)) // Always miss
  }

  fn save(&self, item: &CacheItem) -> Result<(), StoreError> {
    validate_key(item.key())?;
    Ok(()) // Discard
  }
}

/// SQLite-based cache pool.
pub struct SqlitePool {
  conn: Mutex<Connection>,
}

impl SqlitePool {
  /// Open the pool at the default location.
  pub fn open_default() -> Result<Self, StoreError> {
    Self::open(&Self::default_path()?)
  }

  /// Open (or create) the pool at `path`.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// A throwaway pool, handy for tests.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, StoreError> {
    let pool = Self {
      conn: Mutex::new(conn),
    };
    pool.run_migrations()?;
    let purged = pool.purge_expired()?;
    if purged > 0 {
      tracing::debug!(purged, "Removed expired cache items");
    }
    Ok(pool)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Backend("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("jsonapi-cache").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.conn.lock()?;
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(())
  }

  /// Delete every expired item, returning how many were removed.
  pub fn purge_expired(&self) -> Result<usize, StoreError> {
    let conn = self.conn.lock()?;
    let removed = conn.execute(
      "DELETE FROM cache_items WHERE expires_at IS NOT NULL AND expires_at <= ?",
      params![Utc::now().timestamp()],
    )?;
    Ok(removed)
  }

  /// Delete every item.
  pub fn clear(&self) -> Result<(), StoreError> {
    let conn = self.conn.lock()?;
    conn.execute("DELETE FROM cache_items", [])?;
    Ok(())
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_items (
    item_key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    expires_at INTEGER,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_cache_items_expires
    ON cache_items(expires_at);
"#;

impl CacheItemPool for SqlitePool {
  fn get_item(&self, key: &str) -> Result<CacheItem, StoreError> {
    validate_key(key)?;
    let conn = self.conn.lock()?;

    let row: Option<(Vec<u8>, Option<i64>)> = conn
      .query_row(
        "SELECT data, expires_at FROM cache_items WHERE item_key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let (data, expires_at) = match row {
      Some(row) => row,
      None => return Ok(CacheItem::miss(key)),
    };

    if expires_at.is_some_and(|at| at <= Utc::now().timestamp()) {
      conn.execute("DELETE FROM cache_items WHERE item_key = ?", params![key])?;
      return Ok(CacheItem::miss(key));
    }

    let value: Value = serde_json::from_slice(&data)?;
    Ok(CacheItem::hit(key, value))
  }

  fn save(&self, item: &CacheItem) -> Result<(), StoreError> {
    validate_key(item.key())?;
    let data = serde_json::to_vec(item.value().unwrap_or(&Value::Null))?;
    let expires_at = item
      .ttl()
      .map(|secs| Utc::now().timestamp().saturating_add(secs.min(i64::MAX as u64) as i64));

    let conn = self.conn.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO cache_items (item_key, data, expires_at, cached_at)
       VALUES (?, ?, ?, datetime('now'))",
      params![item.key(), data, expires_at],
    )?;

    Ok(())
  }
}
