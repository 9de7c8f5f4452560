//! Parcel geometry retrieval for Vantage.
//!
//! [`GeocoderClient`] resolves addresses against an authenticated parcel
//! boundary API; [`TokenManager`] keeps its bearer token fresh.

pub mod config;
pub mod geocoder;
pub mod memory;
pub mod resolver;
pub mod token;

use async_trait::async_trait;
use vantage_core::{GeocodeError, Geometry};

pub use config::ProviderConfig;
pub use geocoder::GeocoderClient;
pub use memory::StaticSource;
pub use token::TokenManager;

/// Abstraction for resolving a free-text address into a parcel geometry.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    async fn fetch_geometry(&self, address: &str) -> Result<Geometry, GeocodeError>;
}
