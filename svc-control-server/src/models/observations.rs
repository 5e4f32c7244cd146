use chrono::{DateTime, TimeZone, Utc};

use crate::db::Store;
use crate::response::{ServerError, ServerResult};

/// Observations are stored with whole-second precision.
fn ceil_secs(ts: &DateTime<Utc>) -> i64 {
    if ts.timestamp_subsec_nanos() > 0 {
        ts.timestamp() + 1
    } else {
        ts.timestamp()
    }
}

impl Store {
    pub async fn record_observation(
        &self,
        service: &str,
        observed_at: DateTime<Utc>,
        healthy: bool,
    ) -> ServerResult<()> {
        let service_id = self.require_service_id(service).await?;
        sqlx::query(
            "INSERT INTO health_observation (service_id, observed_at, healthy) VALUES (?, ?, ?)",
        )
        .bind(service_id)
        .bind(observed_at.timestamp())
        .bind(healthy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Times of unhealthy observations in `[from, to)`, oldest first.
    pub async fn unhealthy_observations(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        service: Option<&str>,
    ) -> ServerResult<Vec<DateTime<Utc>>> {
        let service_id = match service {
            Some(name) => Some(self.require_service_id(name).await?),
            None => None,
        };

        let rows: Vec<i64> = sqlx::query_scalar(
            "SELECT observed_at FROM health_observation
             WHERE healthy = 0 AND observed_at >= ? AND observed_at < ?
               AND (? IS NULL OR service_id = ?)
             ORDER BY observed_at",
        )
        .bind(ceil_secs(&from))
        .bind(ceil_secs(&to))
        .bind(service_id)
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|secs| {
                Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
                    ServerError::InternalError(format!("invalid observation timestamp {secs}"))
                })
            })
            .collect()
    }

    /// Deletes observations older than `before`; returns how many were removed.
    pub async fn prune_observations(&self, before: DateTime<Utc>) -> ServerResult<u64> {
        let result = sqlx::query("DELETE FROM health_observation WHERE observed_at < ?")
            .bind(before.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
