//! Parcel-to-parcel geodesic distance and compass direction.
//!
//! Distance is measured between the nearest pair of boundary points, found in
//! plain lon/lat space, then measured on the WGS84 ellipsoid. Touching or
//! overlapping parcels have no meaningful nearest-pair bearing, so below
//! `zero_threshold_m` both distance and bearing come from each geometry's
//! interior point instead.

use geo::{
    Bearing, Closest, ClosestPoint, Coord, CoordsIter, Distance, Geodesic, InteriorPoint,
    Intersects, LineString, MultiPolygon, Point, Polygon,
};
use vantage_core::{CompassLabel, GeometryError, Geometry, LonLat, Ring, Winds};

pub const DEFAULT_ZERO_THRESHOLD_M: f64 = 1.0;

/// Tunables for [`distance_and_direction`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    /// Nearest-pair distances below this use interior points instead.
    pub zero_threshold_m: f64,
    pub winds: Winds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            zero_threshold_m: DEFAULT_ZERO_THRESHOLD_M,
            winds: Winds::Eight,
        }
    }
}

/// Distance and direction from geometry `a` toward geometry `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance_m: f64,
    /// `[0, 360)`, clockwise from true north.
    pub bearing_deg: f64,
    pub direction: CompassLabel,
    /// Measured between interior points because the parcels touch.
    pub from_interior: bool,
}

/// Measures from `a` to `b`. Fails only on geometry that cannot describe a
/// place on the ellipsoid (non-finite or out-of-range coordinates,
/// degenerate rings).
pub fn distance_and_direction(
    a: &Geometry,
    b: &Geometry,
    config: &AnalyzerConfig,
) -> Result<Measurement, GeometryError> {
    let ga = to_geo(a)?;
    let gb = to_geo(b)?;

    let apart = match nearest_pair(&ga, &gb)? {
        Proximity::Apart(p1, p2) => {
            let (distance_m, bearing) = inverse(p1, p2);
            (distance_m >= config.zero_threshold_m).then_some((distance_m, bearing))
        }
        Proximity::Overlapping => None,
    };

    let (distance_m, bearing, from_interior) = match apart {
        Some((distance_m, bearing)) => (distance_m, bearing, false),
        None => {
            let r1 = ga.interior_point().ok_or(GeometryError::NoInteriorPoint)?;
            let r2 = gb.interior_point().ok_or(GeometryError::NoInteriorPoint)?;
            let (distance_m, bearing) = inverse(r1, r2);
            (distance_m, bearing, true)
        }
    };

    let bearing_deg = normalize_bearing(bearing);
    Ok(Measurement {
        distance_m,
        bearing_deg,
        direction: CompassLabel::from_bearing(bearing_deg, config.winds),
        from_interior,
    })
}

/// Maps any angle in degrees onto `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// Nearest pair
// ---------------------------------------------------------------------------

enum Proximity {
    Overlapping,
    Apart(Point<f64>, Point<f64>),
}

/// Closest boundary points in planar lon/lat.
///
/// For disjoint shapes the minimum is always reached at a vertex of one side,
/// so projecting every vertex onto the other shape is exhaustive.
fn nearest_pair(a: &geo::Geometry<f64>, b: &geo::Geometry<f64>) -> Result<Proximity, GeometryError> {
    if a.intersects(b) {
        return Ok(Proximity::Overlapping);
    }

    let mut best: Option<(f64, Point<f64>, Point<f64>)> = None;
    let mut consider = |p: Point<f64>, q: Point<f64>| {
        let d = (p.x() - q.x()).hypot(p.y() - q.y());
        if best.map_or(true, |(bd, _, _)| d < bd) {
            best = Some((d, p, q));
        }
    };

    for c in a.coords_iter() {
        let p = Point::from(c);
        if let Some(q) = closest_on(b, p) {
            consider(p, q);
        }
    }
    for c in b.coords_iter() {
        let q = Point::from(c);
        if let Some(p) = closest_on(a, q) {
            consider(p, q);
        }
    }

    best.map(|(_, p, q)| Proximity::Apart(p, q))
        .ok_or(GeometryError::Empty)
}

fn closest_on(g: &geo::Geometry<f64>, p: Point<f64>) -> Option<Point<f64>> {
    match g.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => Some(q),
        Closest::Indeterminate => None,
    }
}

/// WGS84 inverse problem: `(distance_m, initial_bearing_deg)`.
#[inline]
fn inverse(p1: Point<f64>, p2: Point<f64>) -> (f64, f64) {
    (Geodesic::distance(p1, p2), Geodesic::bearing(p1, p2))
}

// ---------------------------------------------------------------------------
// Conversion + sanity checks
// ---------------------------------------------------------------------------

fn to_geo(g: &Geometry) -> Result<geo::Geometry<f64>, GeometryError> {
    Ok(match g {
        Geometry::Point(p) => geo::Geometry::Point(Point::from(checked(p)?)),
        Geometry::Polygon(rings) => geo::Geometry::Polygon(polygon(rings)?),
        Geometry::MultiPolygon(polys) => {
            if polys.is_empty() {
                return Err(GeometryError::Empty);
            }
            let parts = polys
                .iter()
                .map(|rings| polygon(rings))
                .collect::<Result<Vec<_>, _>>()?;
            geo::Geometry::MultiPolygon(MultiPolygon::new(parts))
        }
    })
}

fn polygon(rings: &[Ring]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter().map(|r| ring(r));
    let exterior = rings.next().ok_or(GeometryError::Empty)??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring(positions: &[LonLat]) -> Result<LineString<f64>, GeometryError> {
    let coords = positions
        .iter()
        .map(checked)
        .collect::<Result<Vec<_>, _>>()?;

    let mut distinct = coords.clone();
    distinct.dedup();
    let mut vertices = distinct.len();
    if vertices > 1 && distinct.first() == distinct.last() {
        vertices -= 1;
    }
    if vertices < 3 {
        return Err(GeometryError::DegenerateRing(vertices));
    }

    Ok(LineString::from(coords))
}

fn checked(p: &LonLat) -> Result<Coord<f64>, GeometryError> {
    let (lon, lat) = (p.lon(), p.lat());
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeometryError::NonFinite { lon, lat });
    }
    if lon.abs() > 180.0 || lat.abs() > 90.0 {
        return Err(GeometryError::OutOfRange { lon, lat });
    }
    Ok(Coord { x: lon, y: lat })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lon: f64, lat: f64, size: f64) -> Geometry {
        Geometry::polygon(vec![
            LonLat(lon, lat),
            LonLat(lon + size, lat),
            LonLat(lon + size, lat + size),
            LonLat(lon, lat + size),
            LonLat(lon, lat),
        ])
    }

    fn measure(a: &Geometry, b: &Geometry) -> Measurement {
        distance_and_direction(a, b, &AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn point_due_north() {
        let m = measure(&Geometry::point(0.0, 0.0), &Geometry::point(0.0, 0.01));
        // 0.01 deg of latitude at the equator.
        assert!((m.distance_m - 1105.7).abs() < 1.0, "{}", m.distance_m);
        assert!(m.bearing_deg.abs() < 1e-6);
        assert_eq!(m.direction, CompassLabel::N);
        assert!(!m.from_interior);
    }

    #[test]
    fn point_due_west_is_normalized() {
        let m = measure(&Geometry::point(0.0, 0.0), &Geometry::point(-0.01, 0.0));
        assert!((m.bearing_deg - 270.0).abs() < 1e-6, "{}", m.bearing_deg);
        assert_eq!(m.direction, CompassLabel::W);
    }

    #[test]
    fn separated_parcels_use_nearest_edges() {
        // Two 0.001 deg squares with a 0.001 deg gap, side by side at 38N.
        let a = square(-87.0, 38.0, 0.001);
        let b = square(-86.998, 38.0, 0.001);
        let m = measure(&a, &b);

        // Gap, not centroid spacing (which would be twice as far).
        let expected = 0.001 * 111_320.0 * 38f64.to_radians().cos();
        assert!((m.distance_m - expected).abs() < 1.0, "{}", m.distance_m);
        assert!((m.bearing_deg - 90.0).abs() < 0.1, "{}", m.bearing_deg);
        assert_eq!(m.direction, CompassLabel::E);
        assert!(!m.from_interior);
    }

    #[test]
    fn direction_is_from_first_toward_second() {
        let a = square(-87.0, 38.0, 0.001);
        let b = square(-87.0, 37.99, 0.001);
        assert_eq!(measure(&a, &b).direction, CompassLabel::S);
        assert_eq!(measure(&b, &a).direction, CompassLabel::N);
    }

    #[test]
    fn touching_parcels_fall_back_to_interior_points() {
        let a = square(0.0, 0.0, 0.001);
        let b = square(0.001, 0.0, 0.001);
        let m = measure(&a, &b);

        assert!(m.from_interior);
        // Interior points sit mid-square, ~0.001 deg apart east-west.
        assert!((m.distance_m - 111.3).abs() < 2.0, "{}", m.distance_m);
        assert!((m.bearing_deg - 90.0).abs() < 0.5, "{}", m.bearing_deg);
        assert_eq!(m.direction, CompassLabel::E);
    }

    #[test]
    fn point_inside_parcel_falls_back() {
        let parcel = square(0.0, 0.0, 0.002);
        let inside = Geometry::point(0.0018, 0.001);
        let m = measure(&parcel, &inside);
        assert!(m.from_interior);
        assert!(m.distance_m > 0.0);
        assert_eq!(m.direction, CompassLabel::E);
    }

    #[test]
    fn sub_threshold_gap_falls_back() {
        // ~0.55 m apart.
        let a = Geometry::point(0.0, 0.0);
        let b = Geometry::point(0.000005, 0.0);
        let m = measure(&a, &b);
        assert!(m.from_interior);
        assert!(m.distance_m < 1.0);

        let strict = AnalyzerConfig {
            zero_threshold_m: 0.1,
            ..AnalyzerConfig::default()
        };
        let m = distance_and_direction(&a, &b, &strict).unwrap();
        assert!(!m.from_interior);
    }

    #[test]
    fn multipolygon_uses_nearest_part() {
        let near = vec![vec![
            LonLat(0.002, 0.0),
            LonLat(0.003, 0.0),
            LonLat(0.003, 0.001),
            LonLat(0.002, 0.0),
        ]];
        let far = vec![vec![
            LonLat(0.05, 0.0),
            LonLat(0.06, 0.0),
            LonLat(0.06, 0.001),
            LonLat(0.05, 0.0),
        ]];
        let parcel = Geometry::MultiPolygon(vec![far, near]);
        let m = measure(&Geometry::point(0.0, 0.0), &parcel);
        assert!((m.distance_m - 222.6).abs() < 1.0, "{}", m.distance_m);
    }

    #[test]
    fn sixteen_winds() {
        let config = AnalyzerConfig {
            winds: Winds::Sixteen,
            ..AnalyzerConfig::default()
        };
        let m = distance_and_direction(
            &Geometry::point(0.0, 0.0),
            &Geometry::point(0.01, 0.025),
            &config,
        )
        .unwrap();
        assert_eq!(m.direction, CompassLabel::NNE);
    }

    #[test]
    fn bearing_always_in_range() {
        let origin = Geometry::point(-86.93, 38.39);
        for step in 0..72 {
            let theta = (step as f64 * 5.0).to_radians();
            let target = Geometry::point(-86.93 + 0.01 * theta.sin(), 38.39 + 0.01 * theta.cos());
            let m = measure(&origin, &target);
            assert!((0.0..360.0).contains(&m.bearing_deg), "{}", m.bearing_deg);
        }
    }

    #[test]
    fn normalize_wraps() {
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(725.0), 5.0);
        assert_eq!(normalize_bearing(-1e-18), 0.0);
    }

    #[test]
    fn rejects_unusable_geometry() {
        let ok = Geometry::point(0.0, 0.0);
        let cfg = AnalyzerConfig::default();

        let nan = Geometry::point(f64::NAN, 0.0);
        assert!(matches!(
            distance_and_direction(&ok, &nan, &cfg),
            Err(GeometryError::NonFinite { .. })
        ));

        let polar = Geometry::point(0.0, 95.0);
        assert!(matches!(
            distance_and_direction(&ok, &polar, &cfg),
            Err(GeometryError::OutOfRange { .. })
        ));

        let sliver = Geometry::polygon(vec![LonLat(1.0, 1.0), LonLat(1.1, 1.0), LonLat(1.0, 1.0)]);
        assert!(matches!(
            distance_and_direction(&ok, &sliver, &cfg),
            Err(GeometryError::DegenerateRing(2))
        ));

        assert!(matches!(
            distance_and_direction(&ok, &Geometry::Polygon(vec![]), &cfg),
            Err(GeometryError::Empty)
        ));
    }
}
