//! HTTP transport contract used by the client.
//!
//! The client only needs one request shape (method, path, query pairs) and
//! reads status, headers and the raw body back. Anything that can do that
//! implements [`HttpClient`]; [`ReqwestClient`] is the real one.

mod blocking;

use std::sync::Arc;

use crate::error::TransportError;

pub use blocking::ReqwestClient;

/// Options for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
  /// Query string pairs, sent in order.
  pub query: Vec<(String, String)>,
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.query.push((key.into(), value.into()));
    self
  }
}

/// A response as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      headers: Vec::new(),
      body: body.into(),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  /// First value of a header, matched case-insensitively.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  /// All values of a header joined with ", ", or an empty string.
  pub fn header_line(&self, name: &str) -> String {
    self
      .headers
      .iter()
      .filter(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

/// Something that can perform a request against the remote API.
pub trait HttpClient {
  fn request(
    &self,
    method: &str,
    path: &str,
    options: &RequestOptions,
  ) -> Result<HttpResponse, TransportError>;

  /// The `Authorization` header value attached to every request, if any.
  fn authorization(&self) -> Option<&str>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
  fn request(
    &self,
    method: &str,
    path: &str,
    options: &RequestOptions,
  ) -> Result<HttpResponse, TransportError> {
    (**self).request(method, path, options)
  }

  fn authorization(&self) -> Option<&str> {
    (**self).authorization()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_lookup_ignores_case() {
    let response = HttpResponse::new(200, "{}").with_header("cache-control", "max-age=60");
    assert_eq!(response.header("Cache-Control"), Some("max-age=60"));
    assert_eq!(response.header("Expires"), None);
  }

  #[test]
  fn test_header_line_joins_repeated_headers() {
    let response = HttpResponse::new(200, "{}")
      .with_header("Cache-Control", "public")
      .with_header("CACHE-CONTROL", "max-age=30");
    assert_eq!(response.header_line("cache-control"), "public, max-age=30");
    assert_eq!(response.header_line("etag"), "");
  }

  #[test]
  fn test_request_options_keep_query_order() {
    let options = RequestOptions::new()
      .query("filter[b]", "2")
      .query("filter[a]", "1");
    assert_eq!(
      options.query,
      vec![
        ("filter[b]".to_string(), "2".to_string()),
        ("filter[a]".to_string(), "1".to_string()),
      ]
    );
  }
}
