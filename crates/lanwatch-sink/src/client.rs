//! PostgreSQL connection management and the message-insert client.

use std::time::Duration;

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::config::SinkConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS monitor_messages (
    id BIGSERIAL PRIMARY KEY,
    message TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const INSERT_MESSAGE: &str = "INSERT INTO monitor_messages (message) VALUES ($1)";

/// Errors from sink operations. Internal only: the public surface of
/// [`EventSink`] converts every failure into a disabled handle or a
/// `false` return.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("pool build error: {0}")]
    PoolBuild(String),

    #[error("connection acquisition timed out after {0:?}")]
    AcquireTimeout(Duration),

    #[error("connection acquisition failed: {0}")]
    Acquire(String),

    #[error("query error: {0}")]
    Query(#[from] tokio_postgres::Error),
}

/// Handle to the external durable sink. Clone is cheap (inner pool is
/// reference-counted); a disabled handle turns every insert into a no-op.
#[derive(Clone)]
pub struct EventSink {
    pool: Option<Pool>,
}

impl EventSink {
    /// A sink that accepts and discards everything.
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Connect to PostgreSQL, verify one connection, and ensure the
    /// message table exists.
    ///
    /// Any failure yields a disabled sink with a single warning; the caller
    /// never has to handle a sink error.
    pub async fn connect(config: &SinkConfig) -> Self {
        match Self::try_connect(config).await {
            Ok(sink) => {
                tracing::info!(
                    host = %config.host,
                    port = config.port,
                    database = %config.database,
                    "Connected to sink database"
                );
                sink
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sink unavailable, continuing without it");
                Self::disabled()
            }
        }
    }

    async fn try_connect(config: &SinkConfig) -> Result<Self, SinkError> {
        let mut pg_config = Config::new();
        pg_config.host = Some(config.host.clone());
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database.clone());
        pg_config.user = Some(config.user.clone());
        pg_config.password = Some(config.password.clone());
        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| SinkError::PoolBuild(e.to_string()))?;

        let conn = acquire(&pool).await?;
        conn.execute(CREATE_TABLE, &[]).await?;

        Ok(Self { pool: Some(pool) })
    }

    /// Whether this handle is backed by a live pool.
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    /// Insert one free-text message. Returns whether the write succeeded;
    /// failures are logged at debug level and otherwise swallowed.
    pub async fn insert(&self, message: &str) -> bool {
        let Some(pool) = &self.pool else {
            return false;
        };

        match self.try_insert(pool, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Sink insert failed");
                false
            }
        }
    }

    async fn try_insert(&self, pool: &Pool, message: &str) -> Result<(), SinkError> {
        let conn = acquire(pool).await?;
        conn.execute(INSERT_MESSAGE, &[&message]).await?;
        Ok(())
    }
}

/// Get a pooled connection, bounded by [`CONNECT_TIMEOUT`] so a hung
/// database can never stall the scan loop indefinitely.
async fn acquire(pool: &Pool) -> Result<deadpool_postgres::Object, SinkError> {
    match tokio::time::timeout(CONNECT_TIMEOUT, pool.get()).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(SinkError::Acquire(e.to_string())),
        Err(_) => Err(SinkError::AcquireTimeout(CONNECT_TIMEOUT)),
    }
}
