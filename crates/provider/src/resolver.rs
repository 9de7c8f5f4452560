//! Normalizes parcel-provider response bodies into [`Geometry`].
//!
//! Providers return a GeoJSON `geometry` for parcels they know the boundary
//! of, and only a `center` for ambiguous or non-parcel addresses. The center
//! comes either as `[lon, lat]` or as an object keyed `x`/`longitude` and
//! `y`/`latitude`. Anything else is rejected here so downstream code only
//! ever sees well-formed geometry.

use serde::Deserialize;
use serde_json::{Map, Value};
use vantage_core::Geometry;

/// Longest slice of the response body quoted in an error detail.
const BODY_EXCERPT_LEN: usize = 200;

/// Boundary if usable, else center point, else an error detail.
pub fn resolve_geometry(body: &Value) -> Result<Geometry, String> {
    if let Some(geometry) = body.get("geometry").and_then(boundary) {
        return Ok(geometry);
    }

    if let Some(point) = body.get("center").and_then(center_point) {
        tracing::debug!("no usable boundary, using center point");
        return Ok(point);
    }

    Err(format!(
        "no valid geometry or center in response: {}",
        excerpt(body)
    ))
}

fn boundary(value: &Value) -> Option<Geometry> {
    Geometry::deserialize(value)
        .ok()
        .filter(Geometry::is_well_formed)
}

fn center_point(center: &Value) -> Option<Geometry> {
    let (lon, lat) = match center.get("coordinates")? {
        Value::Array(items) if items.len() == 2 => (number(&items[0])?, number(&items[1])?),
        Value::Object(fields) => (
            first_number(fields, &["x", "longitude"])?,
            first_number(fields, &["y", "latitude"])?,
        ),
        _ => return None,
    };
    Some(Geometry::point(lon, lat))
}

fn first_number(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| fields.get(*k).and_then(number))
}

/// Numbers, or strings holding one.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn excerpt(body: &Value) -> String {
    let text = body.to_string();
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
