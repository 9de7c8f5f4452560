//! Offline geometry source backed by a fixed address table.
//!
//! Used for dry runs from a fixtures file and as the test double for
//! anything that consumes a [`GeometrySource`].

use crate::GeometrySource;
use async_trait::async_trait;
use std::collections::HashMap;
use vantage_core::error::{VantageError, VantageResult};
use vantage_core::{GeocodeError, Geometry};

/// Answers lookups from an in-memory `address -> Geometry` table.
/// Unknown addresses fail the way a provider miss would.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    parcels: HashMap<String, Geometry>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parcel(mut self, address: impl Into<String>, geometry: Geometry) -> Self {
        self.parcels.insert(address.into(), geometry);
        self
    }

    /// Parses a JSON object mapping addresses to GeoJSON geometries.
    pub fn from_json(json: &str) -> VantageResult<Self> {
        let parcels: HashMap<String, Geometry> = serde_json::from_str(json)
            .map_err(|e| VantageError::InvalidInput(format!("bad fixtures file: {e}")))?;
        Ok(Self { parcels })
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

#[async_trait]
impl GeometrySource for StaticSource {
    async fn fetch_geometry(&self, address: &str) -> Result<Geometry, GeocodeError> {
        self.parcels
            .get(address)
            .cloned()
            .ok_or_else(|| GeocodeError::new(address, "no valid geometry or center for address"))
    }
}
