use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netwatch::source::SyntheticFetcher;
use netwatch::{ConfigUpdate, DeliveryError, Engine, EngineConfig, Fetcher, Severity, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Generated interfaces and devices
    Synthetic,
    /// DNA Center network-device inventory
    Dnac,
    /// RESTCONF ietf-interfaces with per-interface statistics
    Restconf,
}

#[derive(Parser, Debug)]
#[command(name = "netwatch")]
#[command(about = "Polling monitor for network devices and interfaces")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where records come from
    #[arg(short, long, value_enum, default_value = "synthetic")]
    source: SourceKind,

    /// Base URL of the controller or RESTCONF data root
    #[arg(short, long)]
    url: Option<String>,

    /// Token sent as X-Auth-Token
    #[arg(long)]
    token: Option<String>,

    /// Accept self-signed certificates
    #[arg(long)]
    insecure: bool,

    /// Polling interval in seconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Points kept per history series (overrides the config file)
    #[arg(long)]
    history_limit: Option<usize>,

    /// Number of synthetic interfaces
    #[arg(long, default_value = "4")]
    interfaces: usize,

    /// Number of synthetic devices
    #[arg(long, default_value = "0")]
    devices: usize,

    /// Run a single cycle, print the snapshot as JSON and exit
    #[arg(long)]
    once: bool,

    /// Write a JSON report to this file after every cycle
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut overrides = ConfigUpdate::new();
    overrides.interval_secs = args.interval;
    overrides.history_limit = args.history_limit;
    let config = EngineConfig::load(args.config.as_deref())?.merged(&overrides)?;

    let fetcher = build_fetcher(&args)?;
    let engine = Engine::with_fetcher(fetcher, config)?;

    if args.once {
        let snapshot = engine.run_cycle_now().await;
        return match &args.export {
            Some(path) => export_to_file(&snapshot, path),
            None => {
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
                Ok(())
            }
        };
    }

    run(&engine, args.export.as_deref()).await
}

/// Run until Ctrl-C, logging every snapshot
async fn run(engine: &Engine, export: Option<&Path>) -> Result<()> {
    let mut updates = engine.subscribe();
    engine.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    log_summary(&snapshot);
                    if let Some(path) = export {
                        if let Err(e) = export_to_file(&snapshot, path) {
                            warn!(error = %e, path = %path.display(), "export failed");
                        }
                    }
                }
                Err(DeliveryError::Lagged(n)) => warn!(dropped = n, "fell behind, skipping snapshots"),
                Err(DeliveryError::Closed) => break,
            }
        }
    }

    engine.stop().await;
    Ok(())
}

fn build_fetcher(args: &Args) -> Result<Arc<dyn Fetcher>> {
    match args.source {
        SourceKind::Synthetic => Ok(Arc::new(
            SyntheticFetcher::builder()
                .interfaces(args.interfaces)
                .devices(args.devices)
                .build(),
        )),
        #[cfg(feature = "http")]
        SourceKind::Dnac => {
            let mut builder = netwatch::source::DnacFetcher::builder().accept_invalid_certs(args.insecure);
            if let Some(url) = &args.url {
                builder = builder.endpoint(url);
            }
            if let Some(token) = &args.token {
                builder = builder.token(token);
            }
            Ok(Arc::new(builder.build()?))
        }
        #[cfg(feature = "http")]
        SourceKind::Restconf => {
            let mut builder = netwatch::source::RestconfFetcher::builder().accept_invalid_certs(args.insecure);
            if let Some(url) = &args.url {
                builder = builder.base_url(url);
            }
            if let Some(token) = &args.token {
                builder = builder.token(token);
            }
            Ok(Arc::new(builder.build()?))
        }
        #[cfg(not(feature = "http"))]
        SourceKind::Dnac | SourceKind::Restconf => {
            anyhow::bail!("{:?} source requires the `http` feature", args.source)
        }
    }
}

fn log_summary(snapshot: &Snapshot) {
    if !snapshot.fetch.ok {
        warn!(
            cycle = snapshot.cycle,
            error = snapshot.fetch.error.as_deref().unwrap_or("unknown"),
            "showing data from the last successful fetch"
        );
    }

    info!(
        cycle = snapshot.cycle,
        entities = snapshot.entities.len(),
        operational = snapshot.operational_count(),
        critical = snapshot.count_severity(Severity::Critical),
        warning = snapshot.count_severity(Severity::Warning),
        "snapshot"
    );

    for alert in &snapshot.alerts {
        info!(
            "[{}] {} {}",
            alert.severity.symbol(),
            alert.kind.as_str(),
            alert.message
        );
    }
}

/// Export a snapshot report to a JSON file
fn export_to_file(snapshot: &Snapshot, export_path: &Path) -> Result<()> {
    use std::io::Write;

    let mut export = serde_json::Map::new();

    let devices = snapshot
        .entities
        .values()
        .filter(|e| e.kind() == netwatch::EntityKind::Device)
        .count();

    // Summary
    let summary = serde_json::json!({
        "schema": snapshot.version.to_string(),
        "cycle": snapshot.cycle,
        "timestamp_ms": snapshot.timestamp_ms,
        "fetch_ok": snapshot.fetch.ok,
        "fetch_error": snapshot.fetch.error,
        "skipped_records": snapshot.fetch.skipped_records,
        "total_entities": snapshot.entities.len(),
        "devices": devices,
        "interfaces": snapshot.entities.len() - devices,
        "operational": snapshot.operational_count(),
        "critical": snapshot.count_severity(Severity::Critical),
        "warning": snapshot.count_severity(Severity::Warning),
        "info": snapshot.count_severity(Severity::Info),
    });
    export.insert("summary".to_string(), summary);

    let entities: Vec<&netwatch::Entity> = snapshot.entities.values().collect();
    export.insert("entities".to_string(), serde_json::to_value(entities)?);
    export.insert("alerts".to_string(), serde_json::to_value(&snapshot.alerts)?);

    // Write to file
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
    let mut file = std::fs::File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    info!(path = %export_path.display(), "exported snapshot");
    Ok(())
}
