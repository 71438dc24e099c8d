//! Bootwatch binary
//!
//! Loads the YAML configuration, then either runs a single refresh round and
//! prints each group's aggregated health as JSON (`--once`) or polls forever.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bootwatch::{refresh_round, run_refresh_loop, EndpointKind, HttpActuatorClient, MonitorConfig};

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/bootwatch.yaml";

#[derive(Parser, Debug)]
#[command(name = "bootwatch", about = "Poll and aggregate Spring Boot actuator endpoints")]
struct Args {
    /// Path to the YAML configuration
    #[arg(short, long, env = "BOOTWATCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run one refresh round, print aggregated health and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!(path = %args.config.display(), "Loading configuration");
    let config = MonitorConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    tracing::info!(
        sources = config.sources.len(),
        groups = config.groups.len(),
        interval_secs = config.refresh.interval_secs,
        "Configuration loaded"
    );

    let client = HttpActuatorClient::with_timeout(config.refresh.request_timeout())
        .context("Failed to create HTTP client")?;
    let monitor = config.build_monitor(Arc::new(client)).await?;

    if args.once {
        refresh_round(&monitor).await;
        let mut report = serde_json::Map::new();
        for group in monitor.groups().await {
            let health = monitor.aggregate(group.id(), EndpointKind::Health).await?;
            report.insert(group.name.clone(), serde_json::to_value(health)?);
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let interval = config.refresh.interval();
    tokio::select! {
        _ = run_refresh_loop(monitor, interval) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
