//! PostgreSQL client implementation
//!
//! Wraps a `deadpool-postgres` pool. Every query runs with the configured
//! statement timeout and maps driver errors onto [`StoreError`].

use crate::adapters::store::StoreResult;
use crate::config::schema::PostgreSQLConfig;
use crate::config::secret::redact_url_password;
use crate::domain::{FieldsyncError, Result, StoreError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema applied by [`PostgreSQLClient::ensure_schema`]
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// The pool connects lazily; use [`PostgreSQLClient::test_connection`]
    /// to check reachability.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the
    /// pool cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                FieldsyncError::Configuration(format!(
                    "Invalid PostgreSQL connection string: {}",
                    e
                ))
            })?;
        pg_config.ssl_mode(match config.ssl_mode.as_str() {
            "disable" => SslMode::Disable,
            _ => SslMode::Prefer,
        });
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to create connection pool: {}", e))
            })?;

        tracing::debug!(
            target_db = %redact_url_password(config.connection_string.expose_secret().as_ref()),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> StoreResult<()> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Creates the tables and indexes if they don't exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let client = self.get_connection().await?;
        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        tracing::info!("PostgreSQL schema initialized");
        Ok(())
    }

    async fn get_connection(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to get connection from pool: {}", e))
        })
    }

    async fn connection_with_timeout(&self) -> StoreResult<deadpool_postgres::Object> {
        let client = self.get_connection().await?;
        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to set statement timeout: {}", e))
        })?;
        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        let client = self.connection_with_timeout().await?;
        client
            .query(query, params)
            .await
            .map_err(|e| classify(e, StoreError::QueryFailed))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        let client = self.connection_with_timeout().await?;
        client
            .execute(statement, params)
            .await
            .map_err(|e| classify(e, StoreError::WriteFailed))
    }

    /// The connection string with its password masked
    pub fn connection_string_safe(&self) -> String {
        redact_url_password(self.config.connection_string.expose_secret().as_ref())
    }
}

/// Maps a driver error, singling out statement timeouts
fn classify(err: tokio_postgres::Error, otherwise: fn(String) -> StoreError) -> StoreError {
    if err.code() == Some(&SqlState::QUERY_CANCELED) {
        StoreError::Timeout(err.to_string())
    } else if err.is_closed() {
        StoreError::ConnectionFailed(err.to_string())
    } else if let Some(code) = err.code() {
        otherwise(format!("{} [{}]", err, code.code()))
    } else {
        otherwise(err.to_string())
    }
}
