use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, warn};

use crate::response::{ServerError, ServerResult};

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS service (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS setting (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        service_id INTEGER NOT NULL REFERENCES service(id),
        name TEXT NOT NULL,
        value TEXT NOT NULL,
        default_value TEXT NOT NULL,
        display_name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        data_type TEXT NOT NULL DEFAULT 'string',
        editable INTEGER NOT NULL DEFAULT 0,
        visible INTEGER NOT NULL DEFAULT 1,
        UNIQUE (service_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS health_observation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        service_id INTEGER NOT NULL REFERENCES service(id),
        observed_at INTEGER NOT NULL,
        healthy INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_health_observation_observed_at
        ON health_observation (observed_at)",
    "CREATE INDEX IF NOT EXISTS idx_health_observation_service
        ON health_observation (service_id, observed_at)",
];

/// Handle to the settings store. Cheap to clone; all clones share one pool.
#[derive(Clone, Debug)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    /// Opens the pool lazily; nothing touches the database until first use.
    pub fn connect(url: &str, max_connections: u32) -> ServerResult<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_lazy_with(opts);

        Ok(Self { pool })
    }

    /// Single-connection in-memory store; the database lives as long as the pool.
    #[cfg(test)]
    pub async fn memory() -> Self {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .unwrap();
        let store = Self { pool };
        store.ensure_schema().await.unwrap();
        store
    }

    /// Trivial round trip used by the readiness probe and startup gating.
    pub async fn ping(&self) -> ServerResult<()> {
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        if one == 1 {
            Ok(())
        } else {
            Err(ServerError::StoreUnavailable(format!(
                "unexpected probe result {one}"
            )))
        }
    }

    /// Retries `ping` with exponential backoff until the store answers.
    pub async fn wait_until_ready(&self, max_attempts: usize) -> ServerResult<()> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(max_attempts.saturating_sub(1));

        Retry::spawn(strategy, || async {
            self.ping().await.inspect_err(|e| {
                warn!("Settings store not ready yet: {}", e);
            })
        })
        .await?;

        info!("Connected to settings store");
        Ok(())
    }

    pub async fn ensure_schema(&self) -> ServerResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub(crate) async fn service_id(&self, name: &str) -> ServerResult<Option<i64>> {
        let id = sqlx::query_scalar("SELECT id FROM service WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    pub(crate) async fn require_service_id(&self, name: &str) -> ServerResult<i64> {
        self.service_id(name)
            .await?
            .ok_or_else(|| ServerError::unknown_service(name))
    }
}
