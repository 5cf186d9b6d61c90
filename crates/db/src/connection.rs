use std::time::Duration;

use parcel_core::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::warn;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

/// Waits for the database to accept connections, retrying up to `attempts`
/// times with `retry_delay` between tries. Returns the last error.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
    attempts: u32,
    retry_delay: Duration,
) -> Result<DbPool, sqlx::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect_with_settings(database_url, max_connections, timeout_secs).await {
            Ok(pool) => return Ok(pool),
            Err(error) if attempt < attempts => {
                warn!(
                    event_name = "system.database.connect_retry",
                    correlation_id = "bootstrap",
                    attempt,
                    attempts,
                    error = %error,
                    "database not ready, retrying"
                );
                attempt += 1;
                tokio::time::sleep(retry_delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Opens the pool described by `config`, waiting for the database the way
/// [`connect_with_retry`] does.
pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_retry(
        config.url.expose_secret(),
        config.max_connections,
        config.timeout_secs,
        config.connect_attempts,
        Duration::from_millis(config.connect_retry_delay_ms),
    )
    .await
}
