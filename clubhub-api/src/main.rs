use anyhow::{Context, Result};
use clap::Parser;
use clubhub_api::{AppState, ClubHubServer};
use clubhub_core::logging::{init_logging_with_config, LogConfig};
use clubhub_core::{ClubStore, Config, ShutdownCoordinator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Campus club and event backend
#[derive(Debug, Parser)]
#[command(name = "clubhub-api", version, about)]
struct Args {
    /// TOML configuration file (environment variables still apply on top)
    #[arg(short, long, env = "CLUBHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured bind address port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    if let Some(port) = args.port {
        config.server.bind_address.set_port(port);
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    // validated once, after the command line has had its say
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::from_settings(&config.logging)?)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ClubHub API");

    let store = Arc::new(ClubStore::open(&config.store).context("opening club store")?);
    let state = Arc::new(AppState::new(store.clone(), &config)?);

    let shutdown = Arc::new(ShutdownCoordinator::new(config.server.shutdown_timeout));
    tokio::spawn(shutdown.clone().listen_for_os_signals());

    let server = ClubHubServer::new(
        state,
        config.server.bind_address,
        config.server.cors_allow_any_origin,
    );
    let served = server.run(shutdown.clone()).await;

    if let Err(e) = store.close() {
        error!(error = %e, "Failed to checkpoint store");
    }
    shutdown.mark_complete().await;

    served
}
