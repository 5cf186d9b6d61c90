use std::sync::Arc;
use std::time::Duration;

use parcel_core::config::{AppConfig, ConfigError, LoadOptions};
use parcel_db::{connect_with_config, migrations, DbPool, SqlCustomerRepository};
use thiserror::Error;
use tracing::info;

use crate::directory::CustomerDirectory;
use crate::rpc_server::CustomerRpcServer;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub server: CustomerRpcServer,
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

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        service = "customer",
        "starting customer service bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        service = "customer",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        service = "customer",
        "database migrations applied"
    );

    let directory = CustomerDirectory::new(Arc::new(SqlCustomerRepository::new(db_pool.clone())));
    let server = CustomerRpcServer::new(
        directory,
        Duration::from_millis(config.customer_server.request_timeout_ms),
    );

    Ok(Application { config, db_pool, server })
}
