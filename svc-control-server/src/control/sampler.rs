use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control::reconciler::StatusReconciler;
use crate::db::Store;
use crate::response::ServerResult;

/// Writes the health observation log the history view is built from.
pub struct HealthSampler {
    reconciler: Arc<StatusReconciler>,
    store: Store,
    period: Duration,
    retention: chrono::Duration,
}

impl HealthSampler {
    pub fn new(
        reconciler: Arc<StatusReconciler>,
        store: Store,
        period: Duration,
        retention_days: u32,
    ) -> Self {
        Self {
            reconciler,
            store,
            period,
            retention: chrono::Duration::days(i64::from(retention_days)),
        }
    }

    /// Records one observation per enabled service, then prunes the log.
    /// Returns how many observations were written.
    pub async fn sample_at(&self, now: DateTime<Utc>) -> ServerResult<usize> {
        let statuses = self.reconciler.statuses_at(now).await?;

        let mut recorded = 0;
        for status in statuses.iter().filter(|s| s.enabled) {
            self.store
                .record_observation(&status.name, now, status.is_green())
                .await?;
            recorded += 1;
        }

        let pruned = self.store.prune_observations(now - self.retention).await?;
        if pruned > 0 {
            debug!("Pruned {} health observations", pruned);
        }
        Ok(recorded)
    }

    /// Samples on every tick until `shutdown` fires. Failed ticks are logged
    /// and skipped.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Sampling service health every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sample_at(Utc::now()).await {
                        warn!("Skipping health sample: {}", e);
                    }
                }
            }
        }
        info!("Health sampler stopped");
    }
}
