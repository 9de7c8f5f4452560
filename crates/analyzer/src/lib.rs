//! Geodesic proximity engine, batch orchestrator, report generator, and data sinks.

pub mod batch;
pub mod geodesic;
pub mod reporter;
pub mod sink;

pub use batch::BatchOrchestrator;
pub use geodesic::{distance_and_direction, AnalyzerConfig, Measurement};
pub use reporter::BatchReport;
