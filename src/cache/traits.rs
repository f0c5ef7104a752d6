//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::StoreError;

/// Characters a cache key may not contain.
pub const RESERVED_KEY_CHARS: &str = "{}()/\\@:";

/// One addressable unit of a cache pool.
///
/// Items are fetched from a pool with [`CacheItemPool::get_item`], which
/// always returns an item: on a miss it is empty and can be filled and handed
/// back to [`CacheItemPool::save`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
  key: String,
  value: Option<Value>,
  hit: bool,
  /// Lifetime in seconds applied when the item is saved
  ttl: Option<u64>,
}

impl CacheItem {
  /// An empty item for a key the pool has nothing for.
  pub fn miss(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: None,
      hit: false,
      ttl: None,
    }
  }

  /// An item found in the pool.
  pub fn hit(key: impl Into<String>, value: Value) -> Self {
    Self {
      key: key.into(),
      value: Some(value),
      hit: true,
      ttl: None,
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn is_hit(&self) -> bool {
    self.hit
  }

  /// Raw stored value, if any.
  pub fn value(&self) -> Option<&Value> {
    self.value.as_ref()
  }

  /// Decode the stored value. An empty item decodes from `null`.
  pub fn get<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
    let value = self.value.clone().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
  }

  /// Replace the value that will be written on save.
  pub fn set<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), StoreError> {
    self.value = Some(serde_json::to_value(value)?);
    Ok(())
  }

  /// Expire the item `seconds` after it is saved.
  pub fn expires_after(&mut self, seconds: u64) {
    self.ttl = Some(seconds);
  }

  pub fn ttl(&self) -> Option<u64> {
    self.ttl
  }
}

/// A key-value store handing out [`CacheItem`]s.
pub trait CacheItemPool {
  fn get_item(&self, key: &str) -> Result<CacheItem, StoreError>;

  /// Persist an item's value and lifetime.
  fn save(&self, item: &CacheItem) -> Result<(), StoreError>;
}

impl<P: CacheItemPool + ?Sized> CacheItemPool for Arc<P> {
  fn get_item(&self, key: &str) -> Result<CacheItem, StoreError> {
    (**self).get_item(key)
  }

  fn save(&self, item: &CacheItem) -> Result<(), StoreError> {
    (**self).save(item)
  }
}

/// Reject empty keys and keys containing reserved characters.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
  if key.is_empty() || key.chars().any(|c| RESERVED_KEY_CHARS.contains(c)) {
    return Err(StoreError::InvalidKey(key.to_string()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_miss_has_no_value() {
    let item = CacheItem::miss("k");
    assert!(!item.is_hit());
    assert!(item.value().is_none());
    assert!(item.get::<Vec<Value>>().is_err());
  }

  #[test]
  fn test_set_and_get() {
    let mut item = CacheItem::miss("k");
    item.set(&vec![json!({"x": 1})]).unwrap();
    item.expires_after(120);
    assert_eq!(item.get::<Vec<Value>>().unwrap(), vec![json!({"x": 1})]);
    assert_eq!(item.ttl(), Some(120));
  }

  #[test]
  fn test_validate_key() {
    assert!(validate_key("abc-some%2Fpath-def").is_ok());
    assert!(validate_key("").is_err());
    assert!(validate_key("a/b").is_err());
    assert!(validate_key("a:b").is_err());
    assert!(validate_key("{x}").is_err());
  }
}
