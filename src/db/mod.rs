//! Database connection management

use crate::config::{DatabaseConfig, SslMode};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;

/// PostgreSQL database connection pool
///
/// Constructed once at startup and closed explicitly on shutdown.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(connect_options(config))
            .await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "PostgreSQL connection pool established"
        );
        Ok(Self { pool })
    }

    /// Create a new database connection pool from a `postgres://` url
    pub async fn connect_url(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the `accounts` table if it does not exist yet
    pub async fn ensure_schema(&self, amount_scale: u32) -> Result<(), sqlx::Error> {
        // DDL can't take bind parameters
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS accounts (
                id BIGINT PRIMARY KEY,
                balance NUMERIC(20, {}) NOT NULL DEFAULT 0
            )",
            amount_scale.min(20)
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        tracing::info!("accounts schema ready");
        Ok(())
    }

    /// Wait for checked-out connections to return, then close the pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .ssl_mode(ssl_mode(config.ssl_mode));

    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if config.statement_timeout_ms > 0 {
        options = options.options([(
            "statement_timeout",
            format!("{}ms", config.statement_timeout_ms),
        )]);
    }
    options
}

fn ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}
