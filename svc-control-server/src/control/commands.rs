use std::sync::Arc;

use svc_control_shared::settings::{SERVICE_ENABLED, flag_string};
use tracing::{info, warn};

use crate::db::Store;
use crate::models::catalog::ServiceCatalog;
use crate::models::settings::ServiceFlags;
use crate::response::{ServerError, ServerResult};
use crate::runtime::host::HostControl;
use crate::runtime::{RuntimeInspector, service_containers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// Named in the ignore list.
    Skipped,
    Failed { kind: &'static str, message: String },
}

/// Per-service results of a batch restart, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartReport {
    pub outcomes: Vec<(String, RestartOutcome)>,
}

impl RestartReport {
    pub fn restarted(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == RestartOutcome::Restarted)
            .map(|(name, _)| name.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RestartOutcome::Failed { .. }))
            .map(|(name, _)| name.as_str())
    }
}

/// Splits a comma separated ignore list, dropping empty entries.
pub fn parse_ignore_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct CommandDispatcher {
    catalog: Arc<ServiceCatalog>,
    store: Store,
    runtime: Arc<dyn RuntimeInspector>,
    host: Arc<dyn HostControl>,
    label_key: String,
}

impl CommandDispatcher {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        store: Store,
        runtime: Arc<dyn RuntimeInspector>,
        host: Arc<dyn HostControl>,
        label_key: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            store,
            runtime,
            host,
            label_key: label_key.into(),
        }
    }

    async fn flags(&self, name: &str) -> ServerResult<ServiceFlags> {
        let records = self.store.get_settings(name).await?;
        Ok(ServiceFlags::from_records(&records))
    }

    pub async fn enable(&self, name: &str) -> ServerResult<()> {
        self.set_enabled(name, true).await
    }

    pub async fn disable(&self, name: &str) -> ServerResult<()> {
        self.set_enabled(name, false).await
    }

    /// Writes `service_enabled`. Starting or stopping the container is left to
    /// the runtime.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> ServerResult<()> {
        if !self.flags(name).await?.supports_disable {
            return Err(ServerError::not_supported(&format!(
                "service {name} cannot be enabled or disabled"
            )));
        }
        self.store
            .set_setting_value(name, SERVICE_ENABLED, &flag_string(enabled))
            .await?;
        info!(service = name, enabled, "Changed service availability");
        Ok(())
    }

    pub async fn restart(&self, name: &str) -> ServerResult<()> {
        if !self.flags(name).await?.supports_restart {
            return Err(ServerError::not_supported(&format!(
                "service {name} cannot be restarted"
            )));
        }
        self.restart_containers(name).await
    }

    /// Restarts every container labelled with `name`.
    async fn restart_containers(&self, name: &str) -> ServerResult<()> {
        let facts = self.runtime.list_containers().await?;
        let ids: Vec<String> = service_containers(&facts, &self.label_key, name)
            .map(|f| f.id.clone())
            .collect();

        if ids.is_empty() {
            warn!("No container found for service {}", name);
            return Err(ServerError::ContainerNotFound(name.to_string()));
        }

        for id in ids {
            self.runtime.restart_container(&id).await?;
            info!(service = name, container = %id, "Restarted container");
        }
        Ok(())
    }

    /// Restarts every defined service not in `ignore`, one at a time and in
    /// definition order. The restart capability flag only guards single
    /// restarts. A failure is recorded and the batch carries on.
    pub async fn restart_all(&self, ignore: &[String]) -> RestartReport {
        let mut report = RestartReport::default();

        for def in &self.catalog.services {
            let name = def.name.clone();
            if ignore.contains(&name) {
                report.outcomes.push((name, RestartOutcome::Skipped));
                continue;
            }

            let outcome = match self.restart_containers(&name).await {
                Ok(()) => RestartOutcome::Restarted,
                Err(e) => {
                    warn!("Failed to restart service {}: {}", name, e);
                    RestartOutcome::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            report.outcomes.push((name, outcome));
        }

        report
    }

    /// Hands the restart off to the host; nothing is awaited afterwards.
    pub async fn restart_host(&self) -> ServerResult<()> {
        self.host.restart_host().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::fakes::{FakeHost, FakeRuntime, LABEL, container};
    use crate::models::catalog::ServiceCatalog;
    use chrono::Utc;
    use std::sync::atomic::Ordering;
    use svc_control_shared::status::HealthState;

    const SETTINGS: &str = r#"{ "services": [
        { "name": "svcA", "settings": [
            { "name": "service_enabled", "value": "true", "editable": true },
            { "name": "service_can_disable", "value": "true" },
            { "name": "service_can_restart", "value": "true" } ] },
        { "name": "svcB", "settings": [
            { "name": "service_enabled", "value": "true", "editable": true },
            { "name": "service_can_restart", "value": "true" } ] },
        { "name": "svcC", "settings": [
            { "name": "service_enabled", "value": "false", "editable": true },
            { "name": "service_can_restart", "value": "true" } ] },
        { "name": "svcX", "settings": [
            { "name": "service_enabled", "value": "true", "editable": true },
            { "name": "service_can_disable", "value": "false" },
            { "name": "service_can_restart", "value": "false" } ] }
    ] }"#;

    async fn dispatcher_for(
        settings: &str,
        runtime: Arc<FakeRuntime>,
    ) -> (CommandDispatcher, Arc<FakeHost>) {
        let catalog = Arc::new(ServiceCatalog::from_json(settings).unwrap());
        let store = Store::memory().await;
        catalog.register(&store).await.unwrap();
        let host = Arc::new(FakeHost::default());
        let dispatcher = CommandDispatcher::new(catalog, store, runtime, host.clone(), LABEL);
        (dispatcher, host)
    }

    async fn setup() -> (CommandDispatcher, Arc<FakeRuntime>, Arc<FakeHost>) {

        let now = Utc::now();
        let runtime = Arc::new(FakeRuntime::with_containers(vec![
            container("ca", "svcA", now, HealthState::Healthy),
            container("cb", "svcB", now, HealthState::Healthy),
            container("cc", "svcC", now, HealthState::Healthy),
            container("cx", "svcX", now, HealthState::Healthy),
        ]));
        let (dispatcher, host) = dispatcher_for(SETTINGS, runtime.clone()).await;
        (dispatcher, runtime, host)
    }

    async fn enabled_value(dispatcher: &CommandDispatcher, name: &str) -> String {
        dispatcher
            .store
            .get_setting(name, SERVICE_ENABLED)
            .await
            .unwrap()
            .value
    }

    #[tokio::test]
    async fn test_disable_then_enable() {
        let (dispatcher, _, _) = setup().await;
        dispatcher.disable("svcA").await.unwrap();
        assert_eq!(enabled_value(&dispatcher, "svcA").await, "false");
        dispatcher.enable("svcA").await.unwrap();
        assert_eq!(enabled_value(&dispatcher, "svcA").await, "true");
    }

    #[tokio::test]
    async fn test_enable_guarded_by_capability() {
        let (dispatcher, _, _) = setup().await;
        let res = dispatcher.disable("svcX").await;
        assert!(matches!(res, Err(ServerError::OperationNotSupported(_))));
        let res = dispatcher.enable("svcX").await;
        assert!(matches!(res, Err(ServerError::OperationNotSupported(_))));
        assert_eq!(enabled_value(&dispatcher, "svcX").await, "true");
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let (dispatcher, _, _) = setup().await;
        assert_eq!(
            dispatcher.enable("ghost").await,
            Err(ServerError::unknown_service("ghost"))
        );
        assert_eq!(
            dispatcher.restart("ghost").await,
            Err(ServerError::unknown_service("ghost"))
        );
    }

    #[tokio::test]
    async fn test_restart_single() {
        let (dispatcher, runtime, _) = setup().await;
        dispatcher.restart("svcB").await.unwrap();
        assert_eq!(runtime.restarted(), vec!["cb"]);

        let res = dispatcher.restart("svcX").await;
        assert!(matches!(res, Err(ServerError::OperationNotSupported(_))));
    }

    #[tokio::test]
    async fn test_restart_without_container() {
        let (dispatcher, _, _) = setup().await;
        let empty = Arc::new(FakeRuntime::default());
        let dispatcher = CommandDispatcher::new(
            dispatcher.catalog.clone(),
            dispatcher.store.clone(),
            empty,
            Arc::new(FakeHost::default()),
            LABEL,
        );
        assert_eq!(
            dispatcher.restart("svcA").await,
            Err(ServerError::ContainerNotFound("svcA".to_string()))
        );
    }

    #[tokio::test]
    async fn test_restart_all_skips_ignored_and_continues_past_failures() {
        let (dispatcher, runtime, _) = setup().await;
        runtime.fail_restart("cb");

        let report = dispatcher.restart_all(&["svcA".to_string()]).await;

        assert_eq!(runtime.restarted(), vec!["cc", "cx"]);
        assert_eq!(report.restarted().collect::<Vec<_>>(), vec!["svcC", "svcX"]);
        assert_eq!(report.failed().collect::<Vec<_>>(), vec!["svcB"]);
        assert_eq!(report.outcomes[0], ("svcA".to_string(), RestartOutcome::Skipped));
        match &report.outcomes[1].1 {
            RestartOutcome::Failed { kind, .. } => assert_eq!(*kind, "RuntimeUnavailable"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restart_all_ignores_capability_flags() {
        let now = Utc::now();
        let runtime = Arc::new(FakeRuntime::with_containers(vec![
            container("ca", "svcA", now, HealthState::Healthy),
            container("cb", "svcB", now, HealthState::Healthy),
            container("cc", "svcC", now, HealthState::Healthy),
        ]));
        let (dispatcher, _) = dispatcher_for(
            r#"{ "services": [ { "name": "svcA" }, { "name": "svcB" }, { "name": "svcC" } ] }"#,
            runtime.clone(),
        )
        .await;

        let report = dispatcher.restart_all(&["svcA".to_string()]).await;

        assert_eq!(runtime.restarted(), vec!["cb", "cc"]);
        assert_eq!(
            report.outcomes,
            vec![
                ("svcA".to_string(), RestartOutcome::Skipped),
                ("svcB".to_string(), RestartOutcome::Restarted),
                ("svcC".to_string(), RestartOutcome::Restarted),
            ]
        );
        assert!(matches!(
            dispatcher.restart("svcB").await,
            Err(ServerError::OperationNotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_restart_all_missing_container_is_failure() {
        let (dispatcher, _) = dispatcher_for(
            r#"{ "services": [ { "name": "svcA" } ] }"#,
            Arc::new(FakeRuntime::default()),
        )
        .await;

        let report = dispatcher.restart_all(&[]).await;
        assert_eq!(report.failed().collect::<Vec<_>>(), vec!["svcA"]);
    }

    #[tokio::test]
    async fn test_restart_host() {
        let (dispatcher, _, host) = setup().await;
        dispatcher.restart_host().await.unwrap();
        assert_eq!(host.restarts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parse_ignore_list() {
        assert_eq!(parse_ignore_list("a, b,,c,"), vec!["a", "b", "c"]);
        assert!(parse_ignore_list("").is_empty());
    }
}
