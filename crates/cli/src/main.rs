//! CLI for the Vantage parcel proximity engine.
//!
//! Pipeline: resolve subject -> resolve surrounding parcels -> geodesic distance and bearing -> report.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use vantage_analyzer::geodesic::AnalyzerConfig;
use vantage_analyzer::sink::json_stream::JsonStreamSink;
use vantage_analyzer::{BatchOrchestrator, BatchReport};
use vantage_core::error::VantageError;
use vantage_core::Winds;
use vantage_provider::config::{DEFAULT_AUTH_URL, DEFAULT_GEOCODER_URL};
use vantage_provider::{GeocoderClient, GeometrySource, ProviderConfig, StaticSource};

#[derive(Parser, Debug)]
#[command(name = "vantage", version, about = "Parcel proximity engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Measure distance and direction from a subject parcel to its neighbors.
    Distances {
        /// Address of the subject parcel.
        #[arg(short, long)]
        subject: String,

        /// Surrounding address; repeat for each parcel.
        #[arg(short, long = "address", required = true)]
        addresses: Vec<String>,

        #[arg(long, env = "PRECISELY_CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,

        #[arg(long, env = "PRECISELY_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        #[arg(long, env = "VANTAGE_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
        auth_url: String,

        #[arg(long, env = "VANTAGE_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
        geocoder_url: String,

        /// Per-request HTTP timeout.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Compass resolution: 8 or 16 sectors.
        #[arg(long, default_value = "8", value_parser = parse_winds)]
        winds: Winds,

        /// Below this many meters, bearing is taken between interior points.
        #[arg(long, default_value_t = 1.0)]
        zero_threshold_m: f64,

        /// Max concurrent address lookups.
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Resolve addresses from a JSON file of address -> GeoJSON geometry
        /// instead of the live geocoder.
        #[arg(long)]
        fixtures: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Sink output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<String>,
    },
}

fn parse_winds(s: &str) -> Result<Winds, String> {
    let n: u8 = s.parse().map_err(|_| format!("not a sector count: {s}"))?;
    Winds::try_from(n)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Distances {
            subject,
            addresses,
            client_id,
            client_secret,
            auth_url,
            geocoder_url,
            timeout_secs,
            winds,
            zero_threshold_m,
            concurrency,
            fixtures,
            json,
            sink,
        } => {
            if !zero_threshold_m.is_finite() || zero_threshold_m < 0.0 {
                return Err(VantageError::InvalidInput(format!(
                    "zero threshold must be a non-negative number, got {zero_threshold_m}"
                ))
                .into());
            }

            let sink = parse_sink(sink.as_deref(), json)?;

            // 1. Pick the geometry source.
            let source: Arc<dyn GeometrySource> = match fixtures {
                Some(path) => {
                    let source = StaticSource::from_json(&std::fs::read_to_string(&path)?)?;
                    tracing::info!(path = %path, parcels = source.len(), "using fixture geometries");
                    Arc::new(source)
                }
                None => {
                    let (Some(id), Some(secret)) = (client_id, client_secret) else {
                        return Err(VantageError::Config(
                            "missing credentials: set --client-id/--client-secret or \
                             PRECISELY_CLIENT_ID/PRECISELY_CLIENT_SECRET"
                                .into(),
                        )
                        .into());
                    };
                    let config = ProviderConfig::new(id, secret)?
                        .with_auth_url(&auth_url)?
                        .with_geocoder_url(&geocoder_url)?
                        .with_timeout(Duration::from_secs(timeout_secs));
                    tracing::info!(geocoder_url = %config.geocoder_url, "using live geocoder");
                    Arc::new(GeocoderClient::new(&config)?)
                }
            };

            // 2. Run the batch. A subject failure ends the command here.
            let orchestrator = BatchOrchestrator::new(source)
                .with_config(AnalyzerConfig {
                    zero_threshold_m,
                    winds,
                })
                .with_concurrency(concurrency);
            let report = orchestrator.analyze(&subject, &addresses).await?;

            // 3. Output.
            match sink {
                Some(SinkTarget::Stdout) => {
                    let n = write_rows(JsonStreamSink::stdout(), &report)?;
                    tracing::info!(rows = n, "ndjson sink: wrote to stdout");
                    // Still print report to stderr so it's visible.
                    eprint!("{}", report.render());
                }
                Some(SinkTarget::File(path)) => {
                    let file = std::fs::File::create(&path)?;
                    let n = write_rows(JsonStreamSink::new(file), &report)?;
                    tracing::info!(rows = n, path = %path, "ndjson sink: wrote to file");
                    eprint!("{}", report.render());
                }
                None if json => {
                    println!("{}", serde_json::to_string_pretty(&report.to_result())?);
                }
                None => print!("{}", report.render()),
            }
        }
    }

    Ok(())
}

/// Where NDJSON rows go.
#[derive(Debug, PartialEq)]
enum SinkTarget {
    Stdout,
    File(String),
}

/// Resolves `--sink`. Unknown targets and `--json` alongside a sink are rejected.
fn parse_sink(spec: Option<&str>, json: bool) -> Result<Option<SinkTarget>, VantageError> {
    let Some(spec) = spec else {
        return Ok(None);
    };
    if json {
        return Err(VantageError::InvalidInput(
            "--json and --sink are mutually exclusive".into(),
        ));
    }
    match spec {
        "ndjson" => Ok(Some(SinkTarget::Stdout)),
        _ => match spec.strip_prefix("ndjson:") {
            Some(path) if !path.is_empty() => Ok(Some(SinkTarget::File(path.to_string()))),
            _ => Err(VantageError::InvalidInput(format!(
                "unknown sink '{spec}': use 'ndjson' or 'ndjson:/path'"
            ))),
        },
    }
}

fn write_rows<W: Write>(mut sink: JsonStreamSink<W>, report: &BatchReport) -> std::io::Result<usize> {
    let (summary, distances, failures) = report.to_rows();
    sink.write_summary(&summary)?;
    sink.write_distances(&distances)?;
    sink.write_failures(&failures)?;
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_targets() {
        assert_eq!(parse_sink(None, false).unwrap(), None);
        assert_eq!(parse_sink(None, true).unwrap(), None);
        assert_eq!(parse_sink(Some("ndjson"), false).unwrap(), Some(SinkTarget::Stdout));
        assert_eq!(
            parse_sink(Some("ndjson:/tmp/rows.ndjson"), false).unwrap(),
            Some(SinkTarget::File("/tmp/rows.ndjson".into()))
        );
    }

    #[test]
    fn unknown_sink_is_rejected() {
        for spec in ["csv", "ndjson:", "starrocks:db"] {
            assert!(matches!(
                parse_sink(Some(spec), false),
                Err(VantageError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn json_with_sink_is_rejected() {
        assert!(matches!(
            parse_sink(Some("ndjson"), true),
            Err(VantageError::InvalidInput(_))
        ));
    }

    #[test]
    fn cli_parses_distances_command() {
        let cli = Cli::try_parse_from([
            "vantage",
            "distances",
            "--subject",
            "1180 WERNSING RD, JASPER, IN 47546",
            "--address",
            "652 NORTH YORK RD, ELMHURST, IL 60126",
            "--winds",
            "16",
            "--sink",
            "bogus",
        ])
        .unwrap();
        let Commands::Distances { winds, sink, json, .. } = cli.command;
        assert_eq!(winds, Winds::Sixteen);
        assert!(!json);
        assert!(parse_sink(sink.as_deref(), json).is_err());
    }
}
