//! Configuration types for the sessions client.

use crate::error::Error;
use url::Url;

/// Default scope requested when none are configured.
pub const DEFAULT_SCOPE: &str = "https://dynamicsessions.io/.default";

/// Default API version for the sessions service.
pub const DEFAULT_API_VERSION: &str = "2024-10-02-preview";

/// Execution sub-path stripped when the endpoint is configured from a full
/// execution URL rather than a service base URL.
const EXECUTION_SUBPATH: &str = "/python/execute";

/// Normalize an endpoint into a canonical base URL.
///
/// Strips the known execution sub-path when present and ensures exactly one
/// trailing slash, so configuration from either a raw execution URL or a base
/// URL converges to the same value. Normalization is idempotent.
pub fn normalize_endpoint(endpoint: &str) -> Result<Url, Error> {
    let stripped = endpoint.replace(EXECUTION_SUBPATH, "");
    let base = format!("{}/", stripped.trim_end_matches('/'));
    Url::parse(&base).map_err(|e| Error::InvalidConfig(format!("invalid endpoint {endpoint}: {e}")))
}

/// Parse a scope string into individual scopes.
///
/// Accepts space, comma, or semicolon separated values; empty segments are
/// dropped.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split([' ', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Options controlling token refresh behavior and scopes.
#[derive(Debug, Clone)]
pub struct TokenProviderOptions {
    /// Scopes to request tokens for. Empty means the default scope.
    pub scopes: Vec<String>,
    /// Minutes before actual expiry at which a cached token is refreshed.
    pub refresh_before_minutes: i64,
}

impl Default for TokenProviderOptions {
    fn default() -> Self {
        Self {
            scopes: Vec::new(),
            refresh_before_minutes: 5,
        }
    }
}

impl TokenProviderOptions {
    /// The configured scopes, or the default scope when none are set.
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            vec![DEFAULT_SCOPE.to_string()]
        } else {
            self.scopes.clone()
        }
    }
}

/// Options for the session pool.
#[derive(Debug, Clone)]
pub struct SessionPoolOptions {
    /// Base endpoint URL for the sessions service.
    pub endpoint: String,
    /// Upper bound on concurrent session creation attempts (default: 10).
    ///
    /// Note: the admission gate is held only for the scan-or-create step, so
    /// this bounds concurrent creation, not the number of live sessions.
    pub max_concurrent_sessions: usize,
    /// Minutes after creation at which a session is considered expired
    /// (default: 30).
    pub session_timeout_minutes: i64,
    /// Container image recorded on new sessions (default: "python:3.11-slim").
    pub container_image: String,
}

impl Default for SessionPoolOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            max_concurrent_sessions: 10,
            session_timeout_minutes: 30,
            container_image: "python:3.11-slim".to_string(),
        }
    }
}

impl SessionPoolOptions {
    /// Validate the options.
    pub fn validate(&self) -> Result<(), Error> {
        if self.endpoint.is_empty() {
            return Err(Error::InvalidConfig("endpoint is required".into()));
        }
        if self.max_concurrent_sessions == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_sessions must be > 0".into(),
            ));
        }
        if self.session_timeout_minutes <= 0 {
            return Err(Error::InvalidConfig(
                "session_timeout_minutes must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Options for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Normalized base endpoint for the sessions service.
    pub endpoint: Url,
    /// API version sent on every request.
    pub api_version: String,
}

impl HttpClientOptions {
    /// Create a new options builder.
    pub fn builder() -> HttpClientOptionsBuilder {
        HttpClientOptionsBuilder::default()
    }
}

/// Builder for [`HttpClientOptions`].
#[derive(Debug, Default)]
pub struct HttpClientOptionsBuilder {
    endpoint: Option<String>,
    api_version: Option<String>,
}

impl HttpClientOptionsBuilder {
    /// Set the service endpoint. A full execution URL is accepted and
    /// normalized to its base.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API version.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Build the options, validating and normalizing the endpoint.
    pub fn build(self) -> Result<HttpClientOptions, Error> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::InvalidConfig("endpoint is required".into()))?;
        let api_version = self
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        if api_version.trim().is_empty() {
            return Err(Error::InvalidConfig("api_version cannot be empty".into()));
        }
        Ok(HttpClientOptions {
            endpoint: normalize_endpoint(&endpoint)?,
            api_version,
        })
    }
}
