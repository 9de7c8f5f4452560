//! Batch report: full-precision results plus a human-readable rendering.

use std::time::Duration;
use vantage_core::{BatchResult, DistanceResult, FailureRecord, Geometry};

/// Everything a batch produced, before presentation rounding.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub subject_address: String,
    pub subject_geometry: Geometry,
    /// Successful measurements, in input order.
    pub results: Vec<DistanceResult>,
    /// Failed addresses, in input order.
    pub failed: Vec<FailureRecord>,
    pub total_time: Duration,
}

impl BatchReport {
    /// Simplified outcome: feet and bearing rounded to one decimal.
    pub fn to_result(&self) -> BatchResult {
        BatchResult {
            subject_address: self.subject_address.clone(),
            distances: self.results.iter().map(DistanceResult::to_row).collect(),
            failed: self.failed.clone(),
        }
    }

    pub fn total_addresses(&self) -> usize {
        self.results.len() + self.failed.len()
    }

    /// Render the report as a formatted string, nearest parcels first.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                   VANTAGE PROXIMITY REPORT                   ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Subject:   {}\n", self.subject_address));
        out.push_str(&format!(
            "║  Geometry:           {:>38} ║\n",
            self.subject_geometry.kind()
        ));
        out.push_str(&format!(
            "║  Addresses:          {:>38} ║\n",
            self.total_addresses()
        ));
        out.push_str(&format!(
            "║  Measured:           {:>38} ║\n",
            self.results.len()
        ));
        out.push_str(&format!(
            "║  Failed:             {:>38} ║\n",
            self.failed.len()
        ));
        out.push_str(&format!(
            "║  Total time:         {:>35?} ║\n",
            self.total_time
        ));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.results.is_empty() {
            out.push_str("║  No surrounding parcels measured.                            ║\n");
        } else {
            out.push_str("║  SURROUNDING PARCELS                                         ║\n");
            out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

            let mut by_distance: Vec<&DistanceResult> = self.results.iter().collect();
            by_distance.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

            for (i, r) in by_distance.iter().enumerate() {
                let row = r.to_row();
                out.push_str(&format!("║  {}. {}\n", i + 1, r.address));
                out.push_str(&format!(
                    "║     {:.1} ft ({:.2} mi)  |  {:<3} |  bearing {:.1}°  |  {}\n",
                    row.distance_ft, r.distance_mi, row.direction, row.bearing_deg,
                    r.polygon.kind()
                ));
            }
        }

        if !self.failed.is_empty() {
            out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
            out.push_str("║  NOT PROCESSED                                               ║\n");
            out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
            for f in &self.failed {
                out.push_str(&format!("║  - {}\n", f.address));
                out.push_str(&format!("║     {}\n", f.error));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::CompassLabel;

    fn report() -> BatchReport {
        BatchReport {
            subject_address: "1180 WERNSING RD, JASPER, IN 47546".into(),
            subject_geometry: Geometry::point(-86.93, 38.39),
            results: vec![
                DistanceResult::new("FAR", 500.0, 10.04, CompassLabel::N, Geometry::point(0.0, 0.0)),
                DistanceResult::new("NEAR", 20.0, 181.0, CompassLabel::S, Geometry::point(0.0, 0.0)),
            ],
            failed: vec![FailureRecord {
                address: "LOST".into(),
                error: "geocoding 'LOST' failed: HTTP 404".into(),
                raw_geometry: None,
            }],
            total_time: Duration::from_millis(42),
        }
    }

    #[test]
    fn result_keeps_input_order_and_rounds() {
        let result = report().to_result();
        assert_eq!(result.distances.len(), 2);
        assert_eq!(result.distances[0].address, "FAR");
        assert_eq!(result.distances[0].distance_ft, 1640.4);
        assert_eq!(result.distances[0].bearing_deg, 10.0);
        assert_eq!(result.failed[0].address, "LOST");
    }

    #[test]
    fn render_sorts_nearest_first_and_lists_failures() {
        let text = report().render();
        let near = text.find("1. NEAR").unwrap();
        let far = text.find("2. FAR").unwrap();
        assert!(near < far);
        assert!(text.contains("NOT PROCESSED"));
        assert!(text.contains("HTTP 404"));
    }
}
