use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parcel_core::config::{AppConfig, LoadOptions};
use parcel_core::runtime::{init_logging, shutdown_signal};
use parcel_customer::{bootstrap, rpc_server};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "customer-service",
    about = "Customer registry served over RPC",
    after_help = "Examples:\n  customer-service\n  customer-service --config config/parcel.toml"
)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Load configuration from this TOML file")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging depends on the loaded config, so load it before bootstrapping.
    let config = AppConfig::load(LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    })?;
    init_logging(&config.logging);

    let app = tokio::select! {
        app = bootstrap::bootstrap_with_config(config) => app?,
        signal = shutdown_signal() => {
            signal?;
            info!(
                event_name = "system.bootstrap.aborted",
                correlation_id = "shutdown",
                "shutdown requested during bootstrap"
            );
            return Ok(());
        }
    };

    let settings = app.config.customer_server.clone();
    let handle = rpc_server::spawn(&settings.bind_address, settings.rpc_port, app.server).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %handle.local_addr(),
        "customer-service started"
    );

    shutdown_signal().await?;
    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = settings.graceful_shutdown_secs,
        "customer-service stopping"
    );

    handle.shutdown(Duration::from_secs(settings.graceful_shutdown_secs)).await;
    app.db_pool.close().await;
    Ok(())
}
