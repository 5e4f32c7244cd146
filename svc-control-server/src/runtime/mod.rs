//! Container runtime collaborators.
//!
//! The control plane only needs two capabilities from the runtime: listing the
//! current containers with their inspection data, and restarting one by id.

pub mod docker;
pub mod host;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use svc_control_shared::status::HealthState;

use crate::response::ServerResult;

/// Snapshot of one container, produced fresh on every reconciliation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerFact {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Raw runtime state, e.g. `running` or `exited`.
    pub status: String,
    pub running: bool,
    pub health: HealthState,
    pub started_at: Option<DateTime<Utc>>,
    pub labels: HashMap<String, String>,
}

impl ContainerFact {
    /// Service this container belongs to, read from the service label.
    pub fn service_name(&self, label_key: &str) -> Option<&str> {
        self.labels.get(label_key).map(String::as_str)
    }
}

/// Containers carrying `service` in the service label, in runtime order.
pub fn service_containers<'a>(
    facts: &'a [ContainerFact],
    label_key: &'a str,
    service: &'a str,
) -> impl Iterator<Item = &'a ContainerFact> + 'a {
    facts
        .iter()
        .filter(move |f| f.service_name(label_key) == Some(service))
}

/// The container backing `service`, if any. At most one is expected; the
/// first one wins.
pub fn match_service<'a>(
    facts: &'a [ContainerFact],
    label_key: &'a str,
    service: &'a str,
) -> Option<&'a ContainerFact> {
    service_containers(facts, label_key, service).next()
}

#[async_trait]
pub trait RuntimeInspector: Send + Sync {
    async fn list_containers(&self) -> ServerResult<Vec<ContainerFact>>;

    async fn restart_container(&self, container_id: &str) -> ServerResult<()>;
}
