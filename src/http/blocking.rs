//! Blocking reqwest implementation of [`HttpClient`].

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use url::Url;

use super::{HttpClient, HttpResponse, RequestOptions};
use crate::error::TransportError;

/// HTTP client bound to a base URL, optionally sending a bearer token.
///
/// The base URL is only parsed when a request is made, so a bad endpoint
/// shows up as a request failure rather than a construction failure.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
  client: Client,
  base_url: String,
  authorization: Option<String>,
}

impl ReqwestClient {
  pub fn new(base_url: &str, token: Option<&str>) -> Self {
    Self::from_client(Client::new(), base_url, token)
  }

  /// Wrap a preconfigured reqwest client, e.g. one with timeouts set.
  pub fn from_client(client: Client, base_url: &str, token: Option<&str>) -> Self {
    let authorization = token
      .filter(|t| !t.is_empty())
      .map(|t| format!("Bearer {}", t));

    Self {
      client,
      base_url: base_url.to_string(),
      authorization,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Resolve `path` against the base URL the way relative references are
  /// resolved in a browser: `https://x/api/` + `all` gives `https://x/api/all`.
  fn resolve(&self, path: &str) -> Result<Url, TransportError> {
    let base = Url::parse(&self.base_url)?;
    Ok(base.join(path)?)
  }
}

impl HttpClient for ReqwestClient {
  fn request(
    &self,
    method: &str,
    path: &str,
    options: &RequestOptions,
  ) -> Result<HttpResponse, TransportError> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
      .map_err(|_| TransportError::InvalidMethod(method.to_string()))?;
    let url = self.resolve(path)?;

    let mut request = self.client.request(method, url);
    if !options.query.is_empty() {
      request = request.query(&options.query);
    }
    if let Some(auth) = &self.authorization {
      request = request.header(AUTHORIZATION, auth);
    }

    let response = request.send()?;
    let status = response.status();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();
    let body = response.bytes()?.to_vec();

    if status.is_client_error() || status.is_server_error() {
      return Err(TransportError::Status {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).into_owned(),
      });
    }

    Ok(HttpResponse {
      status: status.as_u16(),
      headers,
      body,
    })
  }

  fn authorization(&self) -> Option<&str> {
    self.authorization.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_token_becomes_bearer_header() {
    let client = ReqwestClient::new("https://api.example.com/", Some("FooBar"));
    assert_eq!(client.authorization(), Some("Bearer FooBar"));
  }

  #[test]
  fn test_empty_token_means_no_header() {
    assert_eq!(
      ReqwestClient::new("https://api.example.com/", Some("")).authorization(),
      None
    );
    assert_eq!(
      ReqwestClient::new("https://api.example.com/", None).authorization(),
      None
    );
  }

  #[test]
  fn test_resolve_relative_path() {
    let client = ReqwestClient::new("https://api.example.com/v1/", None);
    let url = client.resolve("all").unwrap();
    assert_eq!(url.as_str(), "https://api.example.com/v1/all");

    let url = client.resolve("/root").unwrap();
    assert_eq!(url.as_str(), "https://api.example.com/root");
  }

  #[test]
  fn test_bad_base_url_fails_at_request_time() {
    let client = ReqwestClient::new("not a url", None);
    let err = client
      .request("GET", "all", &RequestOptions::new())
      .unwrap_err();
    assert!(matches!(err, TransportError::InvalidUrl(_)));
  }

  #[test]
  fn test_bad_method_is_rejected() {
    let client = ReqwestClient::new("https://api.example.com/", None);
    let err = client
      .request("GE T", "all", &RequestOptions::new())
      .unwrap_err();
    assert!(matches!(err, TransportError::InvalidMethod(_)));
  }
}
