use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use parcel_core::config::{AppConfig, ConfigError, LoadOptions};
use parcel_db::{connect_with_config, migrations, DbPool, SqlShipmentRepository};
use thiserror::Error;
use tracing::info;

use crate::customer_client::RpcCustomerClient;
use crate::workflow::ShipmentWorkflow;
use crate::{health, http};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Connects storage and wires the HTTP router. The customer service is not
/// contacted here; its client connects on first use.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        service = "shipment",
        "starting shipment service bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        service = "shipment",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        service = "shipment",
        "database migrations applied"
    );

    let customers = RpcCustomerClient::new(
        config.customer_client.address.clone(),
        Duration::from_millis(config.customer_client.timeout_ms),
    );
    let workflow = ShipmentWorkflow::new(
        Arc::new(customers),
        Arc::new(SqlShipmentRepository::new(db_pool.clone())),
    );
    let router = http::router(
        workflow,
        Duration::from_millis(config.shipment_server.request_timeout_ms),
    )
    .merge(health::router(db_pool.clone()));

    Ok(Application { config, db_pool, router })
}
