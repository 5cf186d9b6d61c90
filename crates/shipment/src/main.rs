use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parcel_core::config::{AppConfig, LoadOptions};
use parcel_core::runtime::{init_logging, shutdown_signal};
use parcel_shipment::bootstrap;
use tokio::sync::oneshot;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "shipment-service",
    about = "Shipment HTTP API backed by the customer registry",
    after_help = "Examples:\n  shipment-service\n  shipment-service --config config/parcel.toml"
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

    let settings = app.config.shipment_server.clone();
    let listener =
        tokio::net::TcpListener::bind((settings.bind_address.as_str(), settings.http_port)).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %listener.local_addr()?,
        customer_address = %app.config.customer_client.address,
        "shipment-service started"
    );

    let router = app.router;
    let (stop, stopped) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stopped.await;
            })
            .await
    });

    tokio::select! {
        signal = shutdown_signal() => signal?,
        result = &mut server => {
            result??;
            return Ok(());
        }
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = settings.graceful_shutdown_secs,
        "shipment-service stopping"
    );
    let _ = stop.send(());

    match tokio::time::timeout(Duration::from_secs(settings.graceful_shutdown_secs), &mut server)
        .await
    {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                "in-flight requests abandoned at shutdown"
            );
            server.abort();
        }
    }

    app.db_pool.close().await;
    Ok(())
}
