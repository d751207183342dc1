//! Credential cache with single-flight refresh.
//!
//! This module provides [`TokenCache`], which keeps one reusable bearer token
//! and refreshes it from an underlying [`TokenCredential`] shortly before it
//! expires. Concurrent callers that miss the cache are collapsed into a
//! single underlying fetch; everyone waiting on that fetch observes the same
//! token value.

use crate::config::TokenProviderOptions;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// A bearer token together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Opaque bearer token value.
    pub token: String,
    /// Absolute time at which the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// A source of access tokens.
///
/// Implementations are expected to be slow (network-bound) and possibly
/// rate-limited; [`TokenCache`] exists to minimize calls to them.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquire a fresh token for the given scopes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] when the source cannot issue a token.
    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken>;
}

/// Caches a bearer token and serializes concurrent refreshes.
///
/// The cached token is replaced wholesale on each successful refresh and is
/// treated as stale once its expiry falls within the configured refresh skew.
/// A failed refresh leaves the cache untouched so the next caller can retry.
pub struct TokenCache {
    credential: Arc<dyn TokenCredential>,
    scopes: Vec<String>,
    refresh_before: Duration,
    cached: RwLock<Option<AccessToken>>,
    // Single-flight gate: at most one underlying fetch at a time.
    refresh_gate: Mutex<()>,
}

impl TokenCache {
    /// Create a new cache over the given credential source.
    pub fn new(credential: Arc<dyn TokenCredential>, options: TokenProviderOptions) -> Self {
        Self {
            credential,
            scopes: options.effective_scopes(),
            refresh_before: Duration::minutes(options.refresh_before_minutes),
            cached: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Get a valid bearer token, refreshing the cache if necessary.
    ///
    /// Fast path is a shared-lock read of the cached token. On a miss the
    /// caller acquires the refresh gate, re-checks (another caller may have
    /// refreshed in the meantime), and only then hits the credential source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] when the underlying fetch fails. The
    /// stale cache, if any, is left in place; retry is the caller's choice.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_if_fresh() {
            return Ok(token);
        }

        let _gate = self.refresh_gate.lock().await;

        // Re-check after acquiring the gate: another caller may have already
        // refreshed while we waited.
        if let Some(token) = self.cached_if_fresh() {
            return Ok(token);
        }

        tracing::debug!(scopes = %self.scopes.join(" "), "acquiring new access token");
        let token = self.credential.fetch_token(&self.scopes).await?;
        tracing::debug!(expires_at = %token.expires_at, "acquired access token");

        let value = token.token.clone();
        *self.write_cache() = Some(token);
        Ok(value)
    }

    /// Unconditionally invalidate the cached token.
    ///
    /// Does not trigger a refresh; the next [`get_token`](Self::get_token)
    /// call will fetch from the credential source.
    pub fn clear_cache(&self) {
        tracing::debug!("clearing cached access token");
        *self.write_cache() = None;
    }

    /// Return the cached token value if it is valid for at least the
    /// configured refresh skew.
    fn cached_if_fresh(&self) -> Option<String> {
        let cutoff = Utc::now() + self.refresh_before;
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|t| t.expires_at > cutoff)
            .map(|t| t.token.clone())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, Option<AccessToken>> {
        self.cached.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Credential that exchanges a client id/secret for a token via the OAuth2
/// `client_credentials` grant.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    /// Create a credential against the given token endpoint.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("scope", &scopes.join(" ")),
            ])
            .send()
            .await
            .map_err(|e| Error::Credential(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Credential(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Credential(format!("invalid token response: {e}")))?;

        let token = data
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::Credential("no access token in response".into()))?
            .to_string();

        // Default to one hour when the endpoint omits expires_in.
        let expires_in = data
            .get("expires_in")
            .and_then(|e| e.as_i64())
            .unwrap_or(3600);

        Ok(AccessToken {
            token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}

/// Credential backed by a fixed token, for local use and tests.
pub struct StaticCredential {
    token: String,
    valid_for: Duration,
}

impl StaticCredential {
    /// Create a credential that always returns `token`, valid for an hour.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            valid_for: Duration::hours(1),
        }
    }

    /// Override how long issued tokens stay valid.
    pub fn valid_for(mut self, valid_for: Duration) -> Self {
        self.valid_for = valid_for;
        self
    }
}

#[async_trait]
impl TokenCredential for StaticCredential {
    async fn fetch_token(&self, _scopes: &[String]) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: Utc::now() + self.valid_for,
        })
    }
}
