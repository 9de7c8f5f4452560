//! Endpoint and credential configuration for the parcel provider.

use std::fmt;
use std::time::Duration;
use url::Url;
use vantage_core::error::{VantageError, VantageResult};

pub const DEFAULT_AUTH_URL: &str = "https://api.precisely.com/oauth/token";
pub const DEFAULT_GEOCODER_URL: &str =
    "https://api.precisely.com/property/v2/parcelboundary/byaddress";

/// Per-request timeout for both the token exchange and geocoder lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const CLIENT_ID_ENV: &str = "PRECISELY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "PRECISELY_CLIENT_SECRET";
pub const AUTH_URL_ENV: &str = "VANTAGE_AUTH_URL";
pub const GEOCODER_URL_ENV: &str = "VANTAGE_GEOCODER_URL";

/// Everything needed to talk to the token and geocoder endpoints.
///
/// ```ignore
/// let config = ProviderConfig::from_env()?.with_timeout(Duration::from_secs(5));
/// let client = GeocoderClient::new(&config)?;
/// ```
#[derive(Clone)]
pub struct ProviderConfig {
    pub auth_url: Url,
    pub geocoder_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Default endpoints with the given credentials. Empty credentials are rejected.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> VantageResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(VantageError::Config(
                "client id and client secret must not be empty".into(),
            ));
        }

        Ok(Self {
            auth_url: parse_url(DEFAULT_AUTH_URL)?,
            geocoder_url: parse_url(DEFAULT_GEOCODER_URL)?,
            client_id,
            client_secret,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Reads credentials from `PRECISELY_CLIENT_ID` / `PRECISELY_CLIENT_SECRET`,
    /// and optional endpoint overrides from `VANTAGE_AUTH_URL` / `VANTAGE_GEOCODER_URL`.
    pub fn from_env() -> VantageResult<Self> {
        let client_id = required_env(CLIENT_ID_ENV)?;
        let client_secret = required_env(CLIENT_SECRET_ENV)?;
        let mut config = Self::new(client_id, client_secret)?;

        if let Ok(url) = std::env::var(AUTH_URL_ENV) {
            config = config.with_auth_url(&url)?;
        }
        if let Ok(url) = std::env::var(GEOCODER_URL_ENV) {
            config = config.with_geocoder_url(&url)?;
        }
        Ok(config)
    }

    pub fn with_auth_url(mut self, url: &str) -> VantageResult<Self> {
        self.auth_url = parse_url(url)?;
        Ok(self)
    }

    pub fn with_geocoder_url(mut self, url: &str) -> VantageResult<Self> {
        self.geocoder_url = parse_url(url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared HTTP client; the timeout applies to every request it sends.
    pub fn http_client(&self) -> VantageResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| VantageError::Config(format!("failed to build HTTP client: {e}")))
    }
}

// Keep the secret out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("auth_url", &self.auth_url.as_str())
            .field("geocoder_url", &self.geocoder_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_env(name: &str) -> VantageResult<String> {
    std::env::var(name).map_err(|_| VantageError::Config(format!("{name} is not set")))
}

fn parse_url(raw: &str) -> VantageResult<Url> {
    Url::parse(raw).map_err(|e| VantageError::Config(format!("invalid URL '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProviderConfig::new("id", "secret").unwrap();
        assert_eq!(config.auth_url.as_str(), DEFAULT_AUTH_URL);
        assert_eq!(config.geocoder_url.as_str(), DEFAULT_GEOCODER_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn empty_credentials_are_a_config_error() {
        assert!(matches!(
            ProviderConfig::new("", "secret"),
            Err(VantageError::Config(_))
        ));
        assert!(matches!(
            ProviderConfig::new("id", "  "),
            Err(VantageError::Config(_))
        ));
    }

    #[test]
    fn bad_url_is_rejected() {
        let config = ProviderConfig::new("id", "secret").unwrap();
        assert!(config.with_geocoder_url("not a url").is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ProviderConfig::new("id", "hunter2").unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
