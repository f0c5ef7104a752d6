//! Read-through caching client for JSON:API endpoints.
//!
//! [`JsonApiClient::fetch`] checks a [`CacheItemPool`] first and only on a
//! miss issues a request through an [`HttpClient`]. The response must be a
//! JSON:API document with a `data` array; the `attributes` of its resources
//! are cached for the response's `max-age` (or a default) and returned.
//!
//! ```no_run
//! use jsonapi_cache::{ClientFactory, Filters, JsonApiClient, SqlitePool};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let http = ClientFactory.create("https://api.example.com/v1/", Some("token"));
//! let client = JsonApiClient::new(http, SqlitePool::open_default()?);
//!
//! let mut filters = Filters::new();
//! filters.insert("product".into(), "plissee".into());
//! for item in &client.fetch("all", &filters)? {
//!   println!("{item}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod http;
pub mod jsonapi;
pub mod logging;

pub use cache::{CacheItem, CacheItemPool, MemoryPool, SqlitePool, VoidPool};
pub use client::JsonApiClient;
pub use error::{ApiClientError, ErrorKind, Phase, ResponseError, StoreError, TransportError};
pub use factory::ClientFactory;
pub use http::{HttpClient, HttpResponse, ReqwestClient, RequestOptions};
pub use jsonapi::{Filters, Items};
pub use logging::{LogContext, Logger, NoopLogger, Severity, TracingLogger};
