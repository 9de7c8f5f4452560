//! Fault-isolated batch orchestration.
//!
//! Resolves one subject and N surrounding addresses, measuring each
//! surrounding parcel against the subject. Only a subject failure aborts the
//! batch; every other failure becomes a [`FailureRecord`] in input order.

use crate::geodesic::{distance_and_direction, AnalyzerConfig};
use crate::reporter::BatchReport;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use vantage_core::error::{VantageError, VantageResult};
use vantage_core::{BatchResult, DistanceResult, FailureRecord, Geometry};
use vantage_provider::GeometrySource;

/// Default max concurrent address lookups.
/// Kept low so a batch does not trip provider rate limits.
const DEFAULT_CONCURRENCY: usize = 4;

/// Outcome for a single surrounding address.
type AddressOutcome = Result<DistanceResult, FailureRecord>;

/// Drives geometry lookups and distance math over a batch of addresses.
///
/// Lookups run on a `JoinSet` throttled by a semaphore; results are slotted
/// back by input index, so output order never depends on completion order.
///
/// ```ignore
/// let source = Arc::new(GeocoderClient::new(&ProviderConfig::from_env()?)?);
/// let result = BatchOrchestrator::new(source)
///     .calculate_distances(subject, &surrounding)
///     .await?;
/// ```
pub struct BatchOrchestrator {
    source: Arc<dyn GeometrySource>,
    config: AnalyzerConfig,
    max_concurrent: usize,
}

impl BatchOrchestrator {
    pub fn new(source: Arc<dyn GeometrySource>) -> Self {
        Self {
            source,
            config: AnalyzerConfig::default(),
            max_concurrent: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Override max concurrent lookups (default: 4). `1` runs sequentially.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Simplified batch outcome for report writers.
    ///
    /// Fails only with [`VantageError::SubjectAddress`].
    pub async fn calculate_distances(
        &self,
        subject_address: &str,
        surrounding_addresses: &[String],
    ) -> VantageResult<BatchResult> {
        Ok(self
            .analyze(subject_address, surrounding_addresses)
            .await?
            .to_result())
    }

    /// Full-precision batch outcome, including the subject geometry.
    pub async fn analyze(
        &self,
        subject_address: &str,
        surrounding_addresses: &[String],
    ) -> VantageResult<BatchReport> {
        let t0 = Instant::now();

        tracing::info!(
            subject = subject_address,
            addresses = surrounding_addresses.len(),
            concurrency = self.max_concurrent,
            "starting batch"
        );

        let subject_geometry = self
            .source
            .fetch_geometry(subject_address)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "subject address could not be resolved");
                VantageError::SubjectAddress(e)
            })?;
        let subject = Arc::new(subject_geometry);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (idx, address) in surrounding_addresses.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let subject = Arc::clone(&subject);
            let sem = Arc::clone(&semaphore);
            let address = address.clone();
            let config = self.config;
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = sem.acquire().await.ok();
                let outcome = measure_address(source.as_ref(), &subject, address, &config).await;
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<AddressOutcome>> =
            (0..surrounding_addresses.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => tracing::warn!(error = %e, "lookup task panicked"),
            }
        }

        let mut results = Vec::new();
        let mut failed = Vec::new();
        for (address, slot) in surrounding_addresses.iter().zip(slots) {
            match slot {
                Some(Ok(result)) => results.push(result),
                Some(Err(failure)) => failed.push(failure),
                None => failed.push(FailureRecord {
                    address: address.clone(),
                    error: "lookup task aborted".into(),
                    raw_geometry: None,
                }),
            }
        }

        let total_time = t0.elapsed();
        tracing::info!(
            resolved = results.len(),
            failed = failed.len(),
            elapsed_ms = total_time.as_millis(),
            "batch complete"
        );

        let subject = Arc::try_unwrap(subject).unwrap_or_else(|shared| (*shared).clone());
        Ok(BatchReport {
            subject_address: subject_address.to_string(),
            subject_geometry: subject,
            results,
            failed,
            total_time,
        })
    }
}

/// Lookup, then measure. Either step failing yields a [`FailureRecord`];
/// a measurement failure keeps the resolved geometry for diagnosis.
async fn measure_address(
    source: &dyn GeometrySource,
    subject: &Geometry,
    address: String,
    config: &AnalyzerConfig,
) -> AddressOutcome {
    let geometry = match source.fetch_geometry(&address).await {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(address = %address, error = %e, "lookup failed");
            return Err(FailureRecord {
                address,
                error: e.to_string(),
                raw_geometry: None,
            });
        }
    };

    match distance_and_direction(subject, &geometry, config) {
        Ok(m) => {
            tracing::debug!(
                address = %address,
                distance_m = m.distance_m,
                bearing_deg = m.bearing_deg,
                direction = %m.direction,
                from_interior = m.from_interior,
                "measured"
            );
            Ok(DistanceResult::new(
                address,
                m.distance_m,
                m.bearing_deg,
                m.direction,
                geometry,
            ))
        }
        Err(e) => {
            tracing::warn!(address = %address, error = %e, "distance calc failed");
            Err(FailureRecord {
                address,
                error: format!("Distance calc failed: {e}"),
                raw_geometry: Some(geometry),
            })
        }
    }
}
