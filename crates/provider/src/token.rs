//! OAuth2 client-credentials token cache.
//!
//! One [`TokenManager`] per process, shared via `Arc`. The cached token sits
//! behind an async mutex that stays locked across the exchange, so at most one
//! refresh is in flight and queued callers pick up its result.

use crate::config::ProviderConfig;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;
use vantage_core::AuthError;

/// Refresh this long before the provider-reported expiry.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the response carries no expiry field.
const DEFAULT_LIFETIME_SECS: f64 = 3600.0;

#[derive(Clone)]
struct BearerToken {
    value: String,
    expires_at: Instant,
}

impl BearerToken {
    #[inline]
    fn is_fresh_at(&self, now: Instant) -> bool {
        now + SAFETY_MARGIN < self.expires_at
    }
}

/// Token endpoint body. Providers disagree on the expiry field name and type.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(rename = "expiresIn")]
    expires_in_camel: Option<Lifetime>,
    expires_in: Option<Lifetime>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lifetime {
    Seconds(f64),
    Text(String),
}

impl Lifetime {
    fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(s) => Some(*s),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl TokenResponse {
    fn into_token(self, issued_at: Instant) -> Result<BearerToken, AuthError> {
        let value = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Malformed("missing access_token".into()))?;

        let seconds = match self.expires_in_camel.or(self.expires_in) {
            Some(lifetime) => lifetime
                .seconds()
                .ok_or_else(|| AuthError::Malformed("expiry is not a number".into()))?,
            None => DEFAULT_LIFETIME_SECS,
        };
        let lifetime = Duration::try_from_secs_f64(seconds)
            .map_err(|e| AuthError::Malformed(format!("invalid expiry {seconds}: {e}")))?;

        let expires_at = issued_at
            .checked_add(lifetime)
            .ok_or_else(|| AuthError::Malformed(format!("expiry {seconds}s out of range")))?;

        Ok(BearerToken { value, expires_at })
    }
}

/// Acquires and caches the bearer token for the geocoder.
pub struct TokenManager {
    client: reqwest::Client,
    auth_url: Url,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<BearerToken>>,
}

impl TokenManager {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a token valid for at least [`SAFETY_MARGIN`] beyond now,
    /// exchanging credentials first when the cache is empty or stale.
    ///
    /// A failed exchange leaves the cache untouched.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh_at(Instant::now()) {
                return Ok(token.value.clone());
            }
            tracing::debug!("cached token is stale");
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token; the next call re-authenticates.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    async fn exchange(&self) -> Result<BearerToken, AuthError> {
        let issued_at = Instant::now();
        tracing::info!(auth_url = %self.auth_url, "requesting bearer token");

        let resp = self
            .client
            .post(self.auth_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "token exchange rejected");
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let token = body.into_token(issued_at)?;

        tracing::info!(
            ttl_secs = token.expires_at.saturating_duration_since(issued_at).as_secs(),
            "bearer token refreshed"
        );
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("auth_url", &self.auth_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
