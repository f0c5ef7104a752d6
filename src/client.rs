//! Read-through caching client for JSON:API endpoints.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheItem, CacheItemPool};
use crate::error::{ApiClientError, ErrorKind, StoreError};
use crate::http::HttpClient;
use crate::jsonapi::{
  cache_key, cache_lifetime, decode_data, extract_attributes, filter_query, Filters, Items,
};
use crate::logging::{LogContext, Logger, Severity, TracingLogger};

/// Lifetime of cached results when the response has no usable `max-age`.
pub const DEFAULT_CACHE_LIFETIME: u64 = 3600;

/// Verb used for every request unless overridden.
pub const DEFAULT_METHOD: &str = "GET";

/// JSON:API client with a cache in front of it.
///
/// Each [`fetch`](Self::fetch) looks in the cache first. On a miss it asks
/// the remote API, validates the document, keeps the `attributes` of every
/// resource and stores them for as long as the response's `Cache-Control`
/// allows. Failures are logged once and returned as an [`ApiClientError`]
/// naming the phase they happened in.
pub struct JsonApiClient<C, P> {
  client: C,
  pool: P,
  logger: Arc<dyn Logger>,
  error_level: Severity,
  cache_lifetime_default: u64,
  request_method: String,
}

impl<C: HttpClient, P: CacheItemPool> JsonApiClient<C, P> {
  /// Create a client logging through `tracing`.
  pub fn new(client: C, pool: P) -> Self {
    Self::with_logger(client, pool, Arc::new(TracingLogger))
  }

  pub fn with_logger(client: C, pool: P, logger: Arc<dyn Logger>) -> Self {
    Self {
      client,
      pool,
      logger,
      error_level: Severity::Error,
      cache_lifetime_default: DEFAULT_CACHE_LIFETIME,
      request_method: DEFAULT_METHOD.to_string(),
    }
  }

  /// Severity used when logging failures.
  pub fn with_error_level(mut self, level: Severity) -> Self {
    self.error_level = level;
    self
  }

  /// Lifetime in seconds used when the response does not provide one.
  pub fn with_cache_lifetime(mut self, seconds: u64) -> Self {
    self.cache_lifetime_default = seconds;
    self
  }

  pub fn with_method(mut self, method: impl Into<String>) -> Self {
    self.request_method = method.into();
    self
  }

  pub fn error_level(&self) -> Severity {
    self.error_level
  }

  pub fn cache_lifetime(&self) -> u64 {
    self.cache_lifetime_default
  }

  pub fn method(&self) -> &str {
    &self.request_method
  }

  pub fn http_client(&self) -> &C {
    &self.client
  }

  pub fn pool(&self) -> &P {
    &self.pool
  }

  /// Fetch the items at `path` matching `filters`.
  pub fn fetch(&self, path: &str, filters: &Filters) -> Result<Items, ApiClientError> {
    let start = Instant::now();

    // Ask the cache first
    let mut item = self.guard(self.lookup(path, filters), ApiClientError::Cache)?;
    if item.is_hit() {
      let items = self.guard(item.get::<Items>(), ApiClientError::Cache)?;
      self.logger.log(
        Severity::Info,
        "Found results in cache",
        &summary(path, &items, start),
      );
      return Ok(items);
    }

    // Ask the remote API
    let response = self.guard(
      self
        .client
        .request(&self.request_method, path, &filter_query(filters)),
      ApiClientError::Request,
    )?;

    let data = self.guard(decode_data(&response.body), ApiClientError::Response)?;

    // Build the result and store it
    let items = extract_attributes(data);
    let lifetime = cache_lifetime(
      &response.header_line("Cache-Control"),
      self.cache_lifetime_default,
    );
    self.guard(
      self.store(&mut item, &items, lifetime),
      ApiClientError::Results,
    )?;

    self.logger.log(
      Severity::Notice,
      "Stored results in cache",
      &summary(path, &items, start),
    );
    Ok(items)
  }

  fn lookup(&self, path: &str, filters: &Filters) -> Result<CacheItem, StoreError> {
    let key = cache_key(self.client.authorization(), path, filters)?;
    self.pool.get_item(&key)
  }

  fn store(&self, item: &mut CacheItem, items: &Items, lifetime: u64) -> Result<(), StoreError> {
    item.set(items)?;
    item.expires_after(lifetime);
    self.pool.save(item)
  }

  /// Log a phase failure at the configured level and classify it.
  fn guard<T, E: ErrorKind>(
    &self,
    result: Result<T, E>,
    classify: fn(E) -> ApiClientError,
  ) -> Result<T, ApiClientError> {
    result.map_err(|cause| {
      let message = cause.to_string();
      let context = LogContext::new().with("exception", cause.kind());
      let err = classify(cause);
      self.logger.log(
        self.error_level,
        &format!("{} problem: {}", err.phase().label(), message),
        &context,
      );
      err
    })
  }
}

fn summary(path: &str, items: &Items, start: Instant) -> LogContext {
  LogContext::new()
    .with("path", path)
    .with("count", items.len())
    .with(
      "time",
      format!("{:.3}ms", start.elapsed().as_secs_f64() * 1000.0),
    )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::VoidPool;
  use crate::factory::ClientFactory;

  #[test]
  fn test_defaults() {
    let client = JsonApiClient::new(ClientFactory.create("http://localhost/", None), VoidPool);
    assert_eq!(client.error_level(), Severity::Error);
    assert_eq!(client.cache_lifetime(), 3600);
    assert_eq!(client.method(), "GET");
  }

  #[test]
  fn test_knobs_can_be_overridden() {
    let client = JsonApiClient::new(ClientFactory.create("http://localhost/", None), VoidPool)
      .with_error_level(Severity::Warning)
      .with_cache_lifetime(60)
      .with_method("POST");
    assert_eq!(client.error_level(), Severity::Warning);
    assert_eq!(client.cache_lifetime(), 60);
    assert_eq!(client.method(), "POST");
  }

  #[test]
  fn test_summary_fields() {
    let items = Items::new(vec![serde_json::json!({"x": 1})]);
    let ctx = summary("all", &items, Instant::now());
    assert_eq!(ctx.get("path"), Some("all"));
    assert_eq!(ctx.get("count"), Some("1"));
    assert!(ctx.get("time").is_some_and(|t| t.ends_with("ms")));
  }
}
