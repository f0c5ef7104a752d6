//! JSON:API request and response helpers.
//!
//! Everything here is pure: cache key derivation, the filter query, the
//! `Cache-Control` lifetime and the body validation/extraction rules. The
//! client stitches them together with I/O.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

use crate::error::{ResponseError, StoreError};
use crate::http::RequestOptions;

/// Request filters, kept in insertion order.
///
/// Order matters for the cache key: `{a, b}` and `{b, a}` hash differently.
pub type Filters = IndexMap<String, String>;

/// Stand-in credential for unauthenticated clients.
pub const NO_AUTH: &str = "noauth";

/// Query parameter the filters are nested under.
pub const FILTER_PARAM: &str = "filter";

static MAX_AGE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)max-age=(\d+)").expect("valid max-age pattern"));

/// Derive the cache key for a call.
///
/// `sha256(credential)-urlencode(path)-sha256(json(filters))`, all hex.
pub fn cache_key(
  authorization: Option<&str>,
  path: &str,
  filters: &Filters,
) -> Result<String, StoreError> {
  let credential = authorization.unwrap_or(NO_AUTH);
  let serialized = serde_json::to_string(filters)?;
  let encoded_path: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();

  Ok(format!(
    "{}-{}-{}",
    sha256_hex(credential.as_bytes()),
    encoded_path,
    sha256_hex(serialized.as_bytes())
  ))
}

fn sha256_hex(input: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input);
  hex::encode(hasher.finalize())
}

/// Request options carrying the filters as `filter[name]=value` pairs.
pub fn filter_query(filters: &Filters) -> RequestOptions {
  filters
    .iter()
    .fold(RequestOptions::new(), |options, (name, value)| {
      options.query(format!("{}[{}]", FILTER_PARAM, name), value.as_str())
    })
}

/// Lifetime in seconds from a `Cache-Control` header line, or `default`.
pub fn cache_lifetime(cache_control: &str, default: u64) -> u64 {
  MAX_AGE
    .captures(cache_control)
    .and_then(|caps| caps.get(1))
    .and_then(|m| m.as_str().parse().ok())
    .unwrap_or(default)
}

/// Decode a response body and return its `data` array.
pub fn decode_data(body: &[u8]) -> Result<Vec<Value>, ResponseError> {
  let decoded: Value = serde_json::from_slice(body)?;
  let mut document = match decoded {
    Value::Object(map) => map,
    _ => return Err(ResponseError::NotAnObject),
  };

  match document.remove("data") {
    None | Some(Value::Null) => Err(ResponseError::MissingData),
    Some(Value::Array(data)) => Ok(data),
    Some(_) => Err(ResponseError::DataNotArray),
  }
}

/// Pull `attributes` out of every resource object.
///
/// Elements that are not objects or carry no `attributes` are skipped.
pub fn extract_attributes(data: Vec<Value>) -> Items {
  data
    .into_iter()
    .filter_map(|element| match element {
      Value::Object(mut resource) => resource.remove("attributes"),
      _ => None,
    })
    .collect()
}

/// The items returned by a fetch.
///
/// A plain list: iterate it as often as you like.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Items(Vec<Value>);

impl Items {
  pub fn new(items: Vec<Value>) -> Self {
    Self(items)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Value> {
    self.0.iter()
  }

  pub fn as_slice(&self) -> &[Value] {
    &self.0
  }

  pub fn into_vec(self) -> Vec<Value> {
    self.0
  }
}

impl From<Vec<Value>> for Items {
  fn from(items: Vec<Value>) -> Self {
    Self(items)
  }
}

impl FromIterator<Value> for Items {
  fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl IntoIterator for Items {
  type Item = Value;
  type IntoIter = std::vec::IntoIter<Value>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl<'a> IntoIterator for &'a Items {
  type Item = &'a Value;
  type IntoIter = std::slice::Iter<'a, Value>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
