//! Row-oriented output for batch reports.
//!
//! Three row schemas:
//! - [`BatchSummaryRow`]: one per batch
//! - [`ProximityRow`]: one per measured address (full precision)
//! - [`FailureRow`]: one per address that could not be processed
//!
//! One backend: **NDJSON stream**, newline-delimited JSON to any `Write` impl.

pub mod json_stream;

use crate::reporter::BatchReport;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Serializable row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummaryRow {
    pub subject_address: String,
    pub subject_geometry_kind: String,
    pub total_addresses: u32,
    pub measured: u32,
    pub failed: u32,
    pub total_time_ms: u64,
    pub created_at: String,
}

/// Denormalized: carries the subject so rows stand alone.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityRow {
    pub subject_address: String,
    pub address: String,
    pub distance_m: f64,
    pub distance_ft: f64,
    pub distance_mi: f64,
    pub bearing_deg: f64,
    pub direction: String,
    pub geometry_kind: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    pub subject_address: String,
    pub address: String,
    pub error: String,
    /// Lookup succeeded and the failure was in the distance math.
    pub geometry_resolved: bool,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Builder: BatchReport → Rows
// ---------------------------------------------------------------------------

impl BatchReport {
    /// Flatten the report into sink-ready rows.
    pub fn to_rows(&self) -> (BatchSummaryRow, Vec<ProximityRow>, Vec<FailureRow>) {
        let now = utc_now();

        let summary = BatchSummaryRow {
            subject_address: self.subject_address.clone(),
            subject_geometry_kind: self.subject_geometry.kind().into(),
            total_addresses: self.total_addresses() as u32,
            measured: self.results.len() as u32,
            failed: self.failed.len() as u32,
            total_time_ms: self.total_time.as_millis() as u64,
            created_at: now.clone(),
        };

        let distances = self
            .results
            .iter()
            .map(|r| ProximityRow {
                subject_address: self.subject_address.clone(),
                address: r.address.clone(),
                distance_m: r.distance_m,
                distance_ft: r.distance_ft,
                distance_mi: r.distance_mi,
                bearing_deg: r.bearing_deg,
                direction: r.direction.to_string(),
                geometry_kind: r.polygon.kind().into(),
                created_at: now.clone(),
            })
            .collect();

        let failures = self
            .failed
            .iter()
            .map(|f| FailureRow {
                subject_address: self.subject_address.clone(),
                address: f.address.clone(),
                error: f.error.clone(),
                geometry_resolved: f.raw_geometry.is_some(),
                created_at: now.clone(),
            })
            .collect();

        (summary, distances, failures)
    }
}

/// ISO-8601 UTC timestamp without a date-time dependency.
fn utc_now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_utc(secs)
}

/// Civil date from days since the epoch (Hinnant's algorithm).
fn format_utc(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vantage_core::{CompassLabel, DistanceResult, FailureRecord, Geometry};

    #[test]
    fn utc_formatting() {
        assert_eq!(format_utc(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_utc(951_782_400), "2000-02-29T00:00:00Z");
        assert_eq!(format_utc(1_772_236_800 + 3661), "2026-02-28T01:01:01Z");
    }

    #[test]
    fn rows_from_report() {
        let report = BatchReport {
            subject_address: "S".into(),
            subject_geometry: Geometry::point(0.0, 0.0),
            results: vec![DistanceResult::new(
                "A",
                100.0,
                45.0,
                CompassLabel::NE,
                Geometry::point(0.001, 0.001),
            )],
            failed: vec![FailureRecord {
                address: "B".into(),
                error: "Distance calc failed: ring has 2 vertices, need at least 3".into(),
                raw_geometry: Some(Geometry::point(1.0, 1.0)),
            }],
            total_time: Duration::from_millis(1500),
        };

        let (summary, distances, failures) = report.to_rows();
        assert_eq!(summary.total_addresses, 2);
        assert_eq!(summary.total_time_ms, 1500);
        assert_eq!(distances[0].direction, "NE");
        assert_eq!(distances[0].distance_ft, 328.084);
        assert!(failures[0].geometry_resolved);
    }
}
