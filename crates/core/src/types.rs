//! Domain types for the Vantage proximity engine.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// International foot, rounded the way survey reports quote it.
pub const FEET_PER_METER: f64 = 3.28084;
pub const FEET_PER_MILE: f64 = 5280.0;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A `(longitude, latitude)` position in degrees, serialized as `[lon, lat]`.
///
/// Deserialization accepts GeoJSON positions with extra ordinates
/// (elevation) and keeps only the first two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LonLat(pub f64, pub f64);

impl LonLat {
    #[inline]
    pub fn lon(&self) -> f64 {
        self.0
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.1
    }
}

impl<'de> Deserialize<'de> for LonLat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ordinates = Vec::<f64>::deserialize(deserializer)?;
        match ordinates.as_slice() {
            [lon, lat, ..] => Ok(Self(*lon, *lat)),
            _ => Err(D::Error::invalid_length(
                ordinates.len(),
                &"a position with at least two ordinates",
            )),
        }
    }
}

/// A linear ring; the first ring of a polygon is its exterior.
pub type Ring = Vec<LonLat>;

/// Parcel boundary, or a point when the provider has no boundary.
///
/// Serialized as GeoJSON: `{"type": "Polygon", "coordinates": [[[lon, lat], ...]]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LonLat),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Single-ring polygon from an exterior ring.
    pub fn polygon(exterior: Ring) -> Self {
        Self::Polygon(vec![exterior])
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::Point(LonLat(lon, lat))
    }

    /// GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// True when every polygon has at least one ring and no ring is empty.
    ///
    /// This is a shape check only; coordinate sanity is the analyzer's job.
    pub fn is_well_formed(&self) -> bool {
        fn polygon_ok(rings: &[Ring]) -> bool {
            !rings.is_empty() && rings.iter().all(|r| !r.is_empty())
        }
        match self {
            Self::Point(_) => true,
            Self::Polygon(rings) => polygon_ok(rings),
            Self::MultiPolygon(polys) => !polys.is_empty() && polys.iter().all(|p| polygon_ok(p)),
        }
    }
}

// ---------------------------------------------------------------------------
// Compass
// ---------------------------------------------------------------------------

/// How finely the compass rose is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winds {
    #[default]
    Eight,
    Sixteen,
}

impl Winds {
    pub fn sectors(self) -> usize {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    fn labels(self) -> &'static [CompassLabel] {
        use CompassLabel::*;
        match self {
            Self::Eight => &[N, NE, E, SE, S, SW, W, NW],
            Self::Sixteen => &[
                N, NNE, NE, ENE, E, ESE, SE, SSE, S, SSW, SW, WSW, W, WNW, NW, NNW,
            ],
        }
    }
}

impl TryFrom<u8> for Winds {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(format!("compass must have 8 or 16 sectors, got {other}")),
        }
    }
}

/// Named compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassLabel {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassLabel {
    /// Label for a bearing in degrees clockwise from true north.
    ///
    /// Picks the sector whose center is nearest, wrapping past 360.
    /// Exact half-sector ties round to the even sector.
    pub fn from_bearing(bearing_deg: f64, winds: Winds) -> Self {
        let labels = winds.labels();
        let n = labels.len() as i64;
        let width = 360.0 / n as f64;
        let sector = (bearing_deg / width).round_ties_even() as i64;
        labels[sector.rem_euclid(n) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NNE => "NNE",
            Self::NE => "NE",
            Self::ENE => "ENE",
            Self::E => "E",
            Self::ESE => "ESE",
            Self::SE => "SE",
            Self::SSE => "SSE",
            Self::S => "S",
            Self::SSW => "SSW",
            Self::SW => "SW",
            Self::WSW => "WSW",
            Self::W => "W",
            Self::WNW => "WNW",
            Self::NW => "NW",
            Self::NNW => "NNW",
        }
    }
}

impl fmt::Display for CompassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// Full-precision outcome for one surrounding address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub address: String,
    pub distance_m: f64,
    pub distance_ft: f64,
    pub distance_mi: f64,
    /// `[0, 360)`, 0 = true north, clockwise.
    pub bearing_deg: f64,
    pub direction: CompassLabel,
    pub polygon: Geometry,
}

impl DistanceResult {
    /// Derives feet and miles from meters.
    pub fn new(
        address: impl Into<String>,
        distance_m: f64,
        bearing_deg: f64,
        direction: CompassLabel,
        polygon: Geometry,
    ) -> Self {
        let distance_ft = distance_m * FEET_PER_METER;
        Self {
            address: address.into(),
            distance_m,
            distance_ft,
            distance_mi: distance_ft / FEET_PER_MILE,
            bearing_deg,
            direction,
            polygon,
        }
    }

    /// Presentation form: feet and bearing at one decimal.
    ///
    /// A bearing that rounds up to 360.0 is reported as 0.0.
    pub fn to_row(&self) -> DistanceRow {
        DistanceRow {
            address: self.address.clone(),
            distance_ft: round1(self.distance_ft),
            direction: self.direction,
            bearing_deg: round1(self.bearing_deg) % 360.0,
        }
    }
}

/// One address that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub address: String,
    pub error: String,
    /// Present when the lookup succeeded but distance math did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_geometry: Option<Geometry>,
}

/// Simplified distance entry handed to report writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRow {
    pub address: String,
    pub distance_ft: f64,
    pub direction: CompassLabel,
    pub bearing_deg: f64,
}

/// The batch outcome returned to collaborators.
///
/// Every surrounding address lands in exactly one of `distances` / `failed`,
/// each list in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub subject_address: String,
    pub distances: Vec<DistanceRow>,
    pub failed: Vec<FailureRecord>,
}

/// Nearest tenth of the exact binary value, ties to even.
fn round1(x: f64) -> f64 {
    let scaled = x * 10.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        // The product may have rounded onto the tie; the fused residual
        // tells which side the exact value lies on.
        let residual = x.mul_add(10.0, -scaled);
        if residual > 0.0 {
            floor + 1.0
        } else if residual < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / 10.0
}
