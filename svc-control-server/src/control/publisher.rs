use std::sync::Arc;
use std::time::Duration;

use svc_control_shared::status::ServiceStatus;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::control::reconciler::StatusReconciler;

/// Starts one periodic status push per subscriber.
#[derive(Clone)]
pub struct Publisher {
    reconciler: Arc<StatusReconciler>,
    period: Duration,
}

impl Publisher {
    pub fn new(reconciler: Arc<StatusReconciler>, period: Duration) -> Self {
        Self { reconciler, period }
    }

    /// The first snapshot arrives one period after subscribing. A tick whose
    /// reconciliation fails is skipped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        tokio::spawn({
            let reconciler = self.reconciler.clone();
            let period = self.period;
            let cancel = cancel.clone();
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            match reconciler.current_statuses().await {
                                Ok(statuses) => {
                                    if tx.send(statuses).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!("Skipping status push: {}", e),
                            }
                        }
                    }
                }
                debug!("Status subscription closed");
            }
        });

        Subscription { rx, cancel }
    }
}

/// Receiving end of a subscription. Dropping it stops the periodic task.
pub struct Subscription {
    rx: mpsc::Receiver<Vec<ServiceStatus>>,
    cancel: CancellationToken,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Vec<ServiceStatus>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
