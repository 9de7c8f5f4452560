//! Centralized error types for the Vantage workspace.

use thiserror::Error;

/// Client-credentials exchange failed. Never poisons the token cache.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token request failed: {0}")]
    Transport(String),

    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// Address lookup failed or returned no usable geometry.
#[derive(Debug, Error)]
#[error("geocoding '{address}' failed: {detail}")]
pub struct GeocodeError {
    pub address: String,
    pub detail: String,
}

impl GeocodeError {
    pub fn new(address: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            detail: detail.into(),
        }
    }
}

/// A decoded geometry could not be used for distance math.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate ({lon}, {lat})")]
    NonFinite { lon: f64, lat: f64 },

    #[error("coordinate ({lon}, {lat}) is outside the WGS84 range")]
    OutOfRange { lon: f64, lat: f64 },

    #[error("ring has {0} vertices, need at least 3")]
    DegenerateRing(usize),

    #[error("geometry has no coordinates")]
    Empty,

    #[error("no interior point for geometry")]
    NoInteriorPoint,
}

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VantageError {
    /// The subject address is the anchor of a batch; losing it is fatal.
    #[error("Subject address invalid: {0}")]
    SubjectAddress(GeocodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type VantageResult<T> = Result<T, VantageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_error_names_the_address() {
        let err = VantageError::SubjectAddress(GeocodeError::new("1 NOWHERE ST", "HTTP 404"));
        let msg = err.to_string();
        assert!(msg.starts_with("Subject address invalid"));
        assert!(msg.contains("1 NOWHERE ST"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn config_error_message() {
        let err = VantageError::Config("client id and client secret must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: client id and client secret must not be empty"
        );
    }
}
