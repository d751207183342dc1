//! HTTP transport for the sessions service.
//!
//! Turns a (method, relative path, session id, optional body) tuple into an
//! authenticated request against the configured base endpoint, and folds
//! non-success responses into a single descriptive error.

use crate::config::HttpClientOptions;
use crate::error::{Error, Result};
use crate::token::TokenCache;
use reqwest::{Client, Method, Response};
use std::sync::Arc;
use url::Url;

/// User agent attached to every outgoing request.
pub const USER_AGENT: &str = concat!("aca-sessions/", env!("CARGO_PKG_VERSION"));

/// Request body variants accepted by [`SessionsHttpClient::send`].
pub enum Payload {
    /// No body.
    None,
    /// JSON body.
    Json(serde_json::Value),
    /// Multipart form body.
    Multipart(reqwest::multipart::Form),
}

/// Authenticated HTTP client for the sessions service.
///
/// Holds a reference to the credential cache and an HTTP sender; it owns no
/// other state. A missing credential cache is permitted; requests are then
/// sent unauthenticated.
pub struct SessionsHttpClient {
    http: Client,
    options: HttpClientOptions,
    token_cache: Option<Arc<TokenCache>>,
}

impl SessionsHttpClient {
    /// Create a client with a default HTTP sender.
    pub fn new(options: HttpClientOptions, token_cache: Option<Arc<TokenCache>>) -> Self {
        Self::with_http_client(Client::new(), options, token_cache)
    }

    /// Create a client over a caller-provided HTTP sender.
    pub fn with_http_client(
        http: Client,
        options: HttpClientOptions,
        token_cache: Option<Arc<TokenCache>>,
    ) -> Self {
        Self {
            http,
            options,
            token_cache,
        }
    }

    /// The normalized base endpoint requests are issued against.
    pub fn base_endpoint(&self) -> &Url {
        &self.options.endpoint
    }

    /// Send a request and verify the response is successful.
    ///
    /// The target is `base + path` with `identifier` and `api-version` query
    /// parameters appended. A bearer header is attached when a credential
    /// cache is configured and yields a non-empty token.
    ///
    /// # Errors
    ///
    /// - [`Error::Credential`] when the token refresh fails.
    /// - [`Error::Transport`] when the request cannot be delivered.
    /// - [`Error::RemoteService`] for non-2xx responses, carrying the URL,
    ///   status code, reason phrase, and response body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        session_id: &str,
        payload: Payload,
    ) -> Result<Response> {
        let url = self.request_url(path, session_id)?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(reqwest::header::USER_AGENT, USER_AGENT);

        if let Some(cache) = &self.token_cache {
            let token = cache.get_token().await?;
            if !token.trim().is_empty() {
                request = request.bearer_auth(token);
            }
        }

        let request = match payload {
            Payload::None => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        tracing::debug!(method = %method, url = %url, "sending request");

        let response = request.send().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            // Read the body before giving up on the response; some runtimes
            // discard it after a status assertion.
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(url = %url, status = status.as_u16(), "request rejected");
            return Err(Error::RemoteService {
                url: url.to_string(),
                status: status.as_u16(),
                reason,
                body,
            });
        }

        Ok(response)
    }

    /// Build the full request target for a path and session id.
    fn request_url(&self, path: &str, session_id: &str) -> Result<Url> {
        let mut url = self
            .options
            .endpoint
            .join(path)
            .map_err(|e| Error::InvalidConfig(format!("invalid request path {path}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("identifier", session_id)
            .append_pair("api-version", &self.options.api_version);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(endpoint: &str) -> SessionsHttpClient {
        let options = HttpClientOptions::builder()
            .endpoint(endpoint)
            .api_version("2024-10-02-preview")
            .build()
            .expect("valid options");
        SessionsHttpClient::new(options, None)
    }

    #[test]
    fn test_request_url_shape() {
        let client = client_for("https://example.com");
        let url = client.request_url("executions", "sid-1").expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/executions?identifier=sid-1&api-version=2024-10-02-preview"
        );
    }

    #[test]
    fn test_request_url_from_execution_endpoint() {
        let client = client_for("https://example.com/python/execute");
        let url = client.request_url("files", "sid-2").expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/files?identifier=sid-2&api-version=2024-10-02-preview"
        );
    }

    #[test]
    fn test_user_agent_names_library() {
        assert!(USER_AGENT.starts_with("aca-sessions/"));
    }
}
