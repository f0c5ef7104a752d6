//! Reqwest transport and the full client against a live axum server.
//!
//! The server runs on a random port in its own tokio runtime; the blocking
//! client under test runs on the test thread.

use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsonapi_cache::{
  ApiClientError, ClientFactory, Filters, HttpClient, JsonApiClient, MemoryPool, NoopLogger,
  RequestOptions, TransportError,
};

/// Echo the request's credentials and query back as one JSON:API resource.
async fn echo(
  State(hits): State<Arc<AtomicUsize>>,
  headers: HeaderMap,
  RawQuery(query): RawQuery,
) -> impl IntoResponse {
  hits.fetch_add(1, Ordering::SeqCst);
  let auth = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .map(String::from);
  let body = json!({
    "data": [{
      "type": "echo",
      "id": "1",
      "attributes": { "auth": auth, "query": query.unwrap_or_default() }
    }]
  });
  ([(header::CACHE_CONTROL, "public, max-age=120")], Json(body))
}

async fn broken() -> impl IntoResponse {
  "hello!"
}

/// Start the server, returning its base URL and the request counter.
fn spawn_server() -> (String, Arc<AtomicUsize>) {
  let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = std_listener.local_addr().unwrap();
  std_listener.set_nonblocking(true).unwrap();

  let hits = Arc::new(AtomicUsize::new(0));
  let app = Router::new()
    .route("/v1/all", get(echo))
    .route("/v1/broken", get(broken))
    .with_state(hits.clone());

  std::thread::spawn(move || {
    let rt = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .unwrap();
    rt.block_on(async {
      let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
      axum::serve(listener, app).await.unwrap();
    })
  });

  (format!("http://{}/v1/", addr), hits)
}

fn decoded_query(raw: &str) -> Vec<(String, String)> {
  url::form_urlencoded::parse(raw.as_bytes())
    .into_owned()
    .collect()
}

#[test]
fn test_request_carries_bearer_and_filter_query() {
  let (base, _) = spawn_server();
  let client = ClientFactory.create(&base, Some("FooBar"));
  let options = RequestOptions::new().query("filter[product]", "plissee");

  let response = client.request("GET", "all", &options).unwrap();

  assert_eq!(response.status, 200);
  assert_eq!(response.header_line("Cache-Control"), "public, max-age=120");
  let body: Value = serde_json::from_slice(&response.body).unwrap();
  let attributes = &body["data"][0]["attributes"];
  assert_eq!(attributes["auth"], "Bearer FooBar");
  assert_eq!(
    decoded_query(attributes["query"].as_str().unwrap()),
    vec![("filter[product]".to_string(), "plissee".to_string())]
  );
}

#[test]
fn test_request_without_token_has_no_authorization() {
  let (base, _) = spawn_server();
  let client = ClientFactory.create(&base, None);

  let response = client.request("GET", "all", &RequestOptions::new()).unwrap();

  let body: Value = serde_json::from_slice(&response.body).unwrap();
  assert_eq!(body["data"][0]["attributes"]["auth"], Value::Null);
  assert_eq!(body["data"][0]["attributes"]["query"], "");
}

#[test]
fn test_not_found_is_a_status_error() {
  let (base, _) = spawn_server();
  let client = ClientFactory.create(&base, None);

  let err = client
    .request("GET", "missing", &RequestOptions::new())
    .unwrap_err();

  assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[test]
fn test_fetch_end_to_end_caches_results() {
  let (base, hits) = spawn_server();
  let http = ClientFactory.create(&base, Some("FooBar"));
  let client = JsonApiClient::with_logger(http, MemoryPool::new(), Arc::new(NoopLogger));
  let mut filters = Filters::new();
  filters.insert("product".to_string(), "plissee".to_string());

  let first = client.fetch("all", &filters).unwrap();
  let second = client.fetch("all", &filters).unwrap();

  assert_eq!(first, second);
  assert_eq!(first.len(), 1);
  assert_eq!(first.as_slice()[0]["auth"], "Bearer FooBar");
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fetch_maps_http_failures() {
  let (base, _) = spawn_server();
  let client = JsonApiClient::with_logger(
    ClientFactory.create(&base, None),
    MemoryPool::new(),
    Arc::new(NoopLogger),
  );

  let err = client.fetch("missing", &Filters::new()).unwrap_err();
  assert!(matches!(
    err,
    ApiClientError::Request(TransportError::Status { status: 404, .. })
  ));

  let err = client.fetch("broken", &Filters::new()).unwrap_err();
  assert!(matches!(err, ApiClientError::Response(_)));
  assert!(client.pool().is_empty());
}
