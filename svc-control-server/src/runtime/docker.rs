use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerInspectResponse, HealthStatusEnum};
use bollard::query_parameters::{ListContainersOptionsBuilder, RestartContainerOptions};
use chrono::{DateTime, Datelike, Utc};
use svc_control_shared::status::HealthState;
use tracing::debug;

use crate::response::{ServerError, ServerResult};
use crate::runtime::{ContainerFact, RuntimeInspector};

/// Seconds bollard waits on the socket before giving up on a request.
const DOCKER_TIMEOUT_SECS: u64 = 30;

/// Runtime inspector talking to the Docker engine over its unix socket.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connection is lazy; an unreachable socket surfaces on first use.
    pub fn connect(socket_path: &str) -> ServerResult<Self> {
        let docker = Docker::connect_with_socket(
            socket_path,
            DOCKER_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )?;
        Ok(Self { docker })
    }
}

pub(crate) fn map_health(status: Option<HealthStatusEnum>) -> HealthState {
    match status {
        Some(HealthStatusEnum::HEALTHY) => HealthState::Healthy,
        Some(HealthStatusEnum::UNHEALTHY) => HealthState::Unhealthy,
        Some(HealthStatusEnum::STARTING) => HealthState::Starting,
        _ => HealthState::None,
    }
}

/// Docker reports `0001-01-01T00:00:00Z` for containers that never started.
pub(crate) fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);
    (ts.year() >= 1970).then_some(ts)
}

pub(crate) fn fact_from_inspect(
    info: ContainerInspectResponse,
    fallback_id: &str,
    listed_image: Option<String>,
) -> ContainerFact {
    let state = info.state.unwrap_or_default();
    let config = info.config.unwrap_or_default();

    ContainerFact {
        id: info.id.unwrap_or_else(|| fallback_id.to_string()),
        name: info
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        image: listed_image.or(config.image).unwrap_or_default(),
        status: state.status.map(|s| s.to_string()).unwrap_or_default(),
        running: state.running.unwrap_or(false),
        health: map_health(state.health.and_then(|h| h.status)),
        started_at: state.started_at.as_deref().and_then(parse_started_at),
        labels: config.labels.unwrap_or_default(),
    }
}

#[async_trait]
impl RuntimeInspector for DockerRuntime {
    async fn list_containers(&self) -> ServerResult<Vec<ContainerFact>> {
        let options = ListContainersOptionsBuilder::new().all(false).build();
        let summaries = self.docker.list_containers(Some(options)).await?;

        let mut facts = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else {
                continue;
            };
            match self.docker.inspect_container(&id, None).await {
                Ok(info) => facts.push(fact_from_inspect(info, &id, summary.image)),
                // Removed between list and inspect.
                Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                }) => {
                    debug!("Container {} vanished before inspection", id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(facts)
    }

    async fn restart_container(&self, container_id: &str) -> ServerResult<()> {
        debug!("Restarting container {}", container_id);
        match self
            .docker
            .restart_container(container_id, None::<RestartContainerOptions>)
            .await
        {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(ServerError::ContainerNotFound(container_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
