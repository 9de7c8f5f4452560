//! Authenticated parcel-boundary lookups over HTTP.

use crate::config::ProviderConfig;
use crate::resolver::resolve_geometry;
use crate::token::TokenManager;
use crate::GeometrySource;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;
use vantage_core::error::VantageResult;
use vantage_core::{GeocodeError, Geometry};

/// Resolves addresses to parcel geometry via the provider's
/// `GET ?address=...` endpoint.
///
/// Asks the [`TokenManager`] for a token on every call; freshness is its job.
///
/// ```ignore
/// let client = GeocoderClient::new(&ProviderConfig::from_env()?)?;
/// let geometry = client.fetch_geometry("652 NORTH YORK RD, ELMHURST, IL 60126").await?;
/// ```
#[derive(Debug)]
pub struct GeocoderClient {
    client: reqwest::Client,
    geocoder_url: Url,
    tokens: Arc<TokenManager>,
}

impl GeocoderClient {
    /// Builds the HTTP client and a fresh token manager from `config`.
    pub fn new(config: &ProviderConfig) -> VantageResult<Self> {
        let client = config.http_client()?;
        let tokens = Arc::new(TokenManager::new(client.clone(), config));

        tracing::info!(geocoder_url = %config.geocoder_url, timeout = ?config.timeout, "geocoder ready");
        Ok(Self::with_token_manager(
            client,
            config.geocoder_url.clone(),
            tokens,
        ))
    }

    /// Shares an existing token manager, e.g. across several clients.
    pub fn with_token_manager(
        client: reqwest::Client,
        geocoder_url: Url,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            client,
            geocoder_url,
            tokens,
        }
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }
}

#[async_trait]
impl GeometrySource for GeocoderClient {
    async fn fetch_geometry(&self, address: &str) -> Result<Geometry, GeocodeError> {
        let token = self
            .tokens
            .get_token()
            .await
            .map_err(|e| GeocodeError::new(address, format!("authentication failed: {e}")))?;

        tracing::debug!(address, "looking up parcel");

        let resp = self
            .client
            .get(self.geocoder_url.clone())
            .query(&[("address", address)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GeocodeError::new(address, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::new(
                address,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GeocodeError::new(address, format!("invalid JSON body: {e}")))?;

        let geometry = resolve_geometry(&body).map_err(|detail| GeocodeError::new(address, detail))?;
        tracing::debug!(address, kind = geometry.kind(), "parcel resolved");
        Ok(geometry)
    }
}
