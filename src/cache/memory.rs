//! In-process cache pool.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::traits::{validate_key, CacheItem, CacheItemPool};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct Entry {
  value: Value,
  ttl: Option<u64>,
  expires_at: Option<Instant>,
}

/// Cache pool backed by a `HashMap`. Entries vanish with the process.
///
/// Expired entries are dropped when read and swept on every save.
#[derive(Debug, Default)]
pub struct MemoryPool {
  entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored entries, expired ones included.
  pub fn len(&self) -> usize {
    self.entries.lock().map(|e| e.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Stored value and lifetime for a key, ignoring expiry.
  pub fn peek(&self, key: &str) -> Option<(Value, Option<u64>)> {
    let entries = self.entries.lock().ok()?;
    entries.get(key).map(|e| (e.value.clone(), e.ttl))
  }
}

impl CacheItemPool for MemoryPool {
  fn get_item(&self, key: &str) -> Result<CacheItem, StoreError> {
    validate_key(key)?;
    let mut entries = self.entries.lock()?;

    let expired = match entries.get(key) {
      Some(entry) => entry.expires_at.is_some_and(|at| Instant::now() >= at),
      None => return Ok(CacheItem::miss(key)),
    };
    if expired {
      entries.remove(key);
      return Ok(CacheItem::miss(key));
    }

    let value = entries
      .get(key)
      .map(|e| e.value.clone())
      .unwrap_or(Value::Null);
    Ok(CacheItem::hit(key, value))
  }

  fn save(&self, item: &CacheItem) -> Result<(), StoreError> {
    validate_key(item.key())?;
    let now = Instant::now();
    let entry = Entry {
      value: item.value().cloned().unwrap_or(Value::Null),
      ttl: item.ttl(),
      // a lifetime past what Instant can represent never expires
      expires_at: item
        .ttl()
        .and_then(|secs| now.checked_add(Duration::from_secs(secs))),
    };

    let mut entries = self.entries.lock()?;
    entries.retain(|_, e| e.expires_at.map_or(true, |at| now < at));
    entries.insert(item.key().to_string(), entry);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_save_then_hit() {
    let pool = MemoryPool::new();
    let mut item = pool.get_item("key").unwrap();
    assert!(!item.is_hit());

    item.set(&json!([{"x": 1}])).unwrap();
    item.expires_after(60);
    pool.save(&item).unwrap();

    let item = pool.get_item("key").unwrap();
    assert!(item.is_hit());
    assert_eq!(item.value(), Some(&json!([{"x": 1}])));
    assert_eq!(pool.peek("key"), Some((json!([{"x": 1}]), Some(60))));
  }

  #[test]
  fn test_zero_lifetime_expires_immediately() {
    let pool = MemoryPool::new();
    let mut item = CacheItem::miss("key");
    item.set(&json!([])).unwrap();
    item.expires_after(0);
    pool.save(&item).unwrap();

    assert!(!pool.get_item("key").unwrap().is_hit());
    assert!(pool.is_empty());
  }

  #[test]
  fn test_huge_lifetime_never_expires() {
    let pool = MemoryPool::new();
    let mut item = CacheItem::miss("key");
    item.set(&json!([1])).unwrap();
    item.expires_after(u64::MAX);
    pool.save(&item).unwrap();

    assert!(pool.get_item("key").unwrap().is_hit());
    assert_eq!(pool.peek("key"), Some((json!([1]), Some(u64::MAX))));
  }

  #[test]
  fn test_save_sweeps_expired_entries() {
    let pool = MemoryPool::new();
    for key in ["stale-1", "stale-2"] {
      let mut item = CacheItem::miss(key);
      item.set(&json!([])).unwrap();
      item.expires_after(0);
      pool.save(&item).unwrap();
    }
    assert_eq!(pool.len(), 1);

    let mut item = CacheItem::miss("fresh");
    item.set(&json!([])).unwrap();
    item.expires_after(60);
    pool.save(&item).unwrap();

    assert_eq!(pool.len(), 1);
    assert!(pool.peek("stale-2").is_none());
    assert!(pool.peek("fresh").is_some());
  }

  #[test]
  fn test_invalid_key_is_rejected() {
    let pool = MemoryPool::new();
    assert!(matches!(
      pool.get_item("a/b"),
      Err(StoreError::InvalidKey(_))
    ));
  }
}
