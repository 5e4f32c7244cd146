//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use svc_control_shared::status::HealthState;

use crate::response::{ServerError, ServerResult};
use crate::runtime::host::HostControl;
use crate::runtime::{ContainerFact, RuntimeInspector};

pub const LABEL: &str = "ham_docker_container_name";

pub fn container(
    id: &str,
    service: &str,
    started_at: DateTime<Utc>,
    health: HealthState,
) -> ContainerFact {
    let mut labels = HashMap::new();
    labels.insert(LABEL.to_string(), service.to_string());
    ContainerFact {
        id: id.to_string(),
        name: service.to_string(),
        image: format!("{service}:latest"),
        status: "running".to_string(),
        running: true,
        health,
        started_at: Some(started_at),
        labels,
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    containers: Mutex<Vec<ContainerFact>>,
    unavailable: AtomicBool,
    failing: Mutex<Vec<String>>,
    pub restarted: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
}

impl FakeRuntime {
    pub fn with_containers(containers: Vec<ContainerFact>) -> Self {
        Self {
            containers: Mutex::new(containers),
            ..Default::default()
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes restarting `container_id` fail.
    pub fn fail_restart(&self, container_id: &str) {
        self.failing.lock().unwrap().push(container_id.to_string());
    }

    pub fn restarted(&self) -> Vec<String> {
        self.restarted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RuntimeInspector for FakeRuntime {
    async fn list_containers(&self) -> ServerResult<Vec<ContainerFact>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServerError::RuntimeUnavailable("socket closed".to_string()));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn restart_container(&self, container_id: &str) -> ServerResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServerError::RuntimeUnavailable("socket closed".to_string()));
        }
        if self.failing.lock().unwrap().iter().any(|id| id == container_id) {
            return Err(ServerError::RuntimeUnavailable(format!(
                "restart of {container_id} failed"
            )));
        }
        self.restarted.lock().unwrap().push(container_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub restarts: AtomicUsize,
}

#[async_trait]
impl HostControl for FakeHost {
    async fn restart_host(&self) -> ServerResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
