//! E2E integration tests: require live geocoder credentials.
//!
//! Run: `PRECISELY_CLIENT_ID=... PRECISELY_CLIENT_SECRET=... cargo test -p vantage-analyzer -- --ignored`

use std::sync::Arc;
use vantage_analyzer::BatchOrchestrator;
use vantage_provider::{GeocoderClient, GeometrySource, ProviderConfig};

const SUBJECT: &str = "1180 WERNSING RD, JASPER, IN 47546";

fn live_client() -> GeocoderClient {
    let config = ProviderConfig::from_env().expect("Set PRECISELY_CLIENT_ID and PRECISELY_CLIENT_SECRET");
    GeocoderClient::new(&config).expect("Failed to build client")
}

#[tokio::test]
#[ignore]
async fn distances_from_jasper() {
    let surrounding = vec![
        "1415 MARTIN LUTHER KING JR. DRIVE, NORTH CHICAGO, IL 60064".to_string(),
        "652 NORTH YORK RD, ELMHURST, IL 60126".to_string(),
    ];

    let result = BatchOrchestrator::new(Arc::new(live_client()))
        .calculate_distances(SUBJECT, &surrounding)
        .await
        .expect("Subject should resolve");

    eprintln!(
        "[e2e] {} measured, {} failed",
        result.distances.len(),
        result.failed.len()
    );
    for row in &result.distances {
        eprintln!(
            "[e2e] {}: {:.1} ft {} ({:.1}°)",
            row.address, row.distance_ft, row.direction, row.bearing_deg
        );
        assert!(row.distance_ft > 0.0);
        assert!((0.0..360.0).contains(&row.bearing_deg));
    }
    assert_eq!(result.distances.len() + result.failed.len(), surrounding.len());
}

#[tokio::test]
#[ignore]
async fn token_is_reused_across_lookups() {
    let client = live_client();

    let first = client.token_manager().get_token().await.expect("Token exchange failed");
    let geometry = client.fetch_geometry(SUBJECT).await.expect("Subject lookup failed");
    let second = client.token_manager().get_token().await.expect("Token exchange failed");

    assert_eq!(first, second, "cached token should be reused");
    eprintln!("[e2e] subject resolved to a {}", geometry.kind());
}
