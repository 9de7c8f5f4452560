//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod types;

pub use error::{AuthError, GeocodeError, GeometryError, VantageError};
pub use types::{
    BatchResult, CompassLabel, DistanceResult, DistanceRow, FailureRecord, Geometry, LonLat, Ring,
    Winds,
};
