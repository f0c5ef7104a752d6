//! Builds HTTP clients for a JSON:API endpoint.

use crate::http::ReqwestClient;

/// Creates a [`ReqwestClient`] from an endpoint and an optional access token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientFactory;

impl ClientFactory {
  /// A non-empty `token` is sent as `Authorization: Bearer <token>` on every
  /// request. No other headers are added.
  pub fn create(&self, endpoint: &str, token: Option<&str>) -> ReqwestClient {
    ReqwestClient::new(endpoint, token)
  }
}
