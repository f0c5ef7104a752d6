//! Error types for the caching JSON:API client.
//!
//! `ApiClientError` is what callers see. It has exactly one variant per
//! processing phase of a fetch, and each variant wraps the failure that
//! occurred inside that phase so it stays reachable through `source()`.

use thiserror::Error;

/// Short, stable name of an underlying failure, used as a log field.
pub trait ErrorKind: std::error::Error {
  fn kind(&self) -> &'static str;
}

/// The processing phase a fetch failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Looking up (or decoding) the cached entry
  Cache,
  /// Talking to the remote API
  Request,
  /// Decoding and validating the response body
  Response,
  /// Writing the extracted items back to the cache
  Results,
}

impl Phase {
  /// Prefix used for the log line emitted when this phase fails.
  pub fn label(self) -> &'static str {
    match self {
      Phase::Cache => "Cache",
      Phase::Request => "Request",
      Phase::Response => "Response",
      Phase::Results => "Results",
    }
  }
}

/// Any failure returned by [`JsonApiClient::fetch`](crate::JsonApiClient::fetch).
#[derive(Debug, Error)]
pub enum ApiClientError {
  #[error("problems with API client cache")]
  Cache(#[source] StoreError),

  #[error("problems with API request")]
  Request(#[source] TransportError),

  #[error("problems with API response")]
  Response(#[source] ResponseError),

  #[error("could not build results")]
  Results(#[source] StoreError),
}

impl ApiClientError {
  pub fn phase(&self) -> Phase {
    match self {
      ApiClientError::Cache(_) => Phase::Cache,
      ApiClientError::Request(_) => Phase::Request,
      ApiClientError::Response(_) => Phase::Response,
      ApiClientError::Results(_) => Phase::Results,
    }
  }
}

/// Failures of the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
  /// The base URL or the request path could not be turned into a URL.
  #[error("invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("invalid HTTP method: {0}")]
  InvalidMethod(String),

  /// Connection, TLS, timeout and body-read failures.
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("server responded with status {status}")]
  Status { status: u16, body: String },

  /// Free-form failure raised by custom transports.
  #[error("{0}")]
  Other(String),
}

impl ErrorKind for TransportError {
  fn kind(&self) -> &'static str {
    match self {
      TransportError::InvalidUrl(_) => "InvalidUrl",
      TransportError::InvalidMethod(_) => "InvalidMethod",
      TransportError::Http(e) if e.is_timeout() => "Timeout",
      TransportError::Http(e) if e.is_connect() => "Connect",
      TransportError::Http(_) => "Http",
      TransportError::Status { status, .. } if *status < 500 => "ClientStatus",
      TransportError::Status { .. } => "ServerStatus",
      TransportError::Other(_) => "Other",
    }
  }
}

/// Reasons a response body is not a usable JSON:API document.
#[derive(Debug, Error)]
pub enum ResponseError {
  #[error("response body is not valid JSON: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("API's JSON response is not an object")]
  NotAnObject,

  #[error("API's JSON response lacks 'data' element")]
  MissingData,

  #[error("API's JSON response element 'data' is not array")]
  DataNotArray,
}

impl ErrorKind for ResponseError {
  fn kind(&self) -> &'static str {
    match self {
      ResponseError::Decode(_) => "Decode",
      ResponseError::NotAnObject => "NotAnObject",
      ResponseError::MissingData => "MissingData",
      ResponseError::DataNotArray => "DataNotArray",
    }
  }
}

/// Failures raised by a cache item pool.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("invalid cache key {0:?}")]
  InvalidKey(String),

  #[error("cache value serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("cache database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("cache IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("cache lock poisoned")]
  Poisoned,

  /// Free-form failure raised by custom pools.
  #[error("{0}")]
  Backend(String),
}

impl ErrorKind for StoreError {
  fn kind(&self) -> &'static str {
    match self {
      StoreError::InvalidKey(_) => "InvalidKey",
      StoreError::Serialization(_) => "Serialization",
      StoreError::Sqlite(_) => "Sqlite",
      StoreError::Io(_) => "Io",
      StoreError::Poisoned => "Poisoned",
      StoreError::Backend(_) => "Backend",
    }
  }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
  fn from(_: std::sync::PoisonError<T>) -> Self {
    StoreError::Poisoned
  }
}
