use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use svc_control_shared::format::{format_timestamp, format_uptime};
use svc_control_shared::status::{HealthState, ServiceStatus, StatusColor};

use crate::db::Store;
use crate::models::catalog::{ServiceCatalog, ServiceDefinition};
use crate::models::settings::{ServiceFlags, SettingRecord};
use crate::response::ServerResult;
use crate::runtime::{ContainerFact, RuntimeInspector, match_service};

/// Merges stored settings with live container facts into one status per
/// service.
///
/// Holds no mutable state; concurrent calls each read their own snapshot.
pub struct StatusReconciler {
    catalog: Arc<ServiceCatalog>,
    store: Store,
    runtime: Arc<dyn RuntimeInspector>,
    label_key: String,
    healthy_uptime_secs: u64,
}

impl StatusReconciler {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        store: Store,
        runtime: Arc<dyn RuntimeInspector>,
        label_key: impl Into<String>,
        healthy_uptime_secs: u64,
    ) -> Self {
        Self {
            catalog,
            store,
            runtime,
            label_key: label_key.into(),
            healthy_uptime_secs,
        }
    }

    pub async fn current_statuses(&self) -> ServerResult<Vec<ServiceStatus>> {
        self.statuses_at(Utc::now()).await
    }

    /// Reads settings for every service, then lists containers once, then
    /// merges. Any failure fails the whole pass.
    pub async fn statuses_at(&self, now: DateTime<Utc>) -> ServerResult<Vec<ServiceStatus>> {
        let settings = try_join_all(
            self.catalog
                .services
                .iter()
                .map(|def| self.store.get_settings(&def.name)),
        )
        .await?;

        let facts = self.runtime.list_containers().await?;

        Ok(self
            .catalog
            .services
            .iter()
            .zip(settings.iter())
            .map(|(def, records)| {
                let fact = match_service(&facts, &self.label_key, &def.name);
                build_status(def, records, fact, now, self.healthy_uptime_secs)
            })
            .collect())
    }
}

/// Whole seconds since `started_at`, floored and never negative.
pub(crate) fn uptime_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started_at).num_seconds()).unwrap_or(0)
}

pub(crate) fn status_color(
    running: bool,
    health: HealthState,
    uptime_secs: u64,
    healthy_uptime_secs: u64,
) -> StatusColor {
    if running && health == HealthState::Healthy && uptime_secs > healthy_uptime_secs {
        StatusColor::Green
    } else {
        StatusColor::Red
    }
}

pub(crate) fn build_status(
    def: &ServiceDefinition,
    records: &[SettingRecord],
    fact: Option<&ContainerFact>,
    now: DateTime<Utc>,
    healthy_uptime_secs: u64,
) -> ServiceStatus {
    let flags = ServiceFlags::from_records(records);
    let mut status = ServiceStatus {
        name: def.name.clone(),
        display_name: def.display_name.clone(),
        description: def.description.clone(),
        enabled: flags.enabled,
        supports_disable: flags.supports_disable,
        supports_restart: flags.supports_restart,
        ..Default::default()
    };

    let Some(fact) = fact else {
        return status;
    };

    status.status = fact.status.clone();
    status.running = fact.running;
    status.health_status = fact.health.to_string();
    status.container_id = fact.id.clone();
    status.container_name = fact.name.clone();
    status.container_image = fact.image.clone();

    if let Some(started_at) = fact.started_at {
        let uptime = uptime_seconds(started_at, now);
        status.start_date_utc = format_timestamp(&started_at);
        status.uptime = format_uptime(uptime);
        status.uptime_seconds = uptime;
    }

    status.status_color = status_color(
        fact.running,
        fact.health,
        status.uptime_seconds,
        healthy_uptime_secs,
    );
    status
}
