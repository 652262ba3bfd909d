//! Faucet service binary

use capsule_common::utils::config::load_config;
use capsule_common::utils::logging::init_logging;
use capsule_faucet::{api, FaucetConfig, FaucetService};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (TOML, YAML or JSON)
    #[arg(short, long, env = "FAUCET_CONFIG")]
    config: Option<String>,

    /// Server address
    #[arg(long)]
    server_addr: Option<String>,

    /// REST (LCD) endpoint of a Capsule node
    #[arg(long)]
    rest_url: Option<String>,

    /// Amount per request (base units)
    #[arg(long)]
    dispense_amount: Option<u64>,

    /// Cooldown per address (hours)
    #[arg(long)]
    rate_limit_hours: Option<u64>,

    /// Persist rate-limit entries at this path
    #[arg(long)]
    db_path: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // File, then environment, then CLI flags
    let mut config = match &args.config {
        Some(path) => {
            let mut config: FaucetConfig = load_config(path)?;
            config.apply_env();
            config
        }
        None => FaucetConfig::from_env(),
    };

    if let Some(addr) = args.server_addr {
        config.server_addr = addr;
    }

    if let Some(url) = args.rest_url {
        config.rest_url = url;
    }

    if let Some(amount) = args.dispense_amount {
        config.dispense_amount = amount;
    }

    if let Some(hours) = args.rate_limit_hours {
        config.rate_limit_hours = hours;
    }

    if let Some(path) = args.db_path {
        config.db_path = Some(path);
    }

    if args.debug {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging)?;

    info!("Starting Capsule Faucet v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Server address: {}", config.server_addr);
    info!("  REST URL: {}", config.rest_url);
    info!("  Chain ID: {}", config.chain_id);
    info!("  Dispense amount: {}{}", config.dispense_amount, config.denom);
    info!("  Address cooldown: {}h", config.rate_limit_hours);
    info!(
        "  Rate-limit store: {}",
        config.db_path.as_deref().unwrap_or("in-memory")
    );

    if !config.has_credential() {
        warn!("No dispenser credential configured, dispense requests will be refused");
    }

    let service = Arc::new(FaucetService::from_config(config.clone())?);
    info!("Faucet service initialized");

    let mut app = api::router(service);

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app = app.layer(cors);
        info!("CORS enabled");
    }

    let addr: SocketAddr = config.server_addr.parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
