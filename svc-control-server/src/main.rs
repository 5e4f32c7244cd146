mod api;
mod config;
mod control;
mod db;
mod models;
mod response;
mod runtime;
mod util;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::control::commands::CommandDispatcher;
use crate::control::history::HealthHistory;
use crate::control::publisher::Publisher;
use crate::control::reconciler::StatusReconciler;
use crate::control::sampler::HealthSampler;
use crate::models::catalog::ServiceCatalog;
use crate::runtime::docker::DockerRuntime;
use crate::runtime::host::ShellHostControl;
use crate::util::app_state::AppState;
use crate::util::logging::init_tracing;

const STORE_CONNECT_ATTEMPTS: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_file = config::settings_file_from_env();
    let catalog = Arc::new(ServiceCatalog::load(&settings_file)?);
    let config = Arc::new(config::AppConfig::from_env(&catalog).context("Failed to load config")?);

    init_tracing(&config.log_level);
    info!(
        "Starting svc-control with {} services from {}",
        catalog.services.len(),
        settings_file.display()
    );

    info!("Connecting to settings store");
    let store = db::Store::connect(&config.database_url, config.db_pool_size)?;
    store.wait_until_ready(STORE_CONNECT_ATTEMPTS).await?;
    store.ensure_schema().await?;
    catalog.register(&store).await?;
    info!("Registered services and seeded settings");

    let runtime = Arc::new(DockerRuntime::connect(&config.docker_socket)?);
    let host = Arc::new(ShellHostControl::new(&config.host_restart_command)?);

    let reconciler = Arc::new(StatusReconciler::new(
        catalog.clone(),
        store.clone(),
        runtime.clone(),
        config.service_label.clone(),
        config.healthy_uptime_secs,
    ));
    let state = AppState {
        catalog: catalog.clone(),
        store: store.clone(),
        config: config.clone(),
        reconciler: reconciler.clone(),
        history: Arc::new(HealthHistory::new(store.clone(), config.health_tiles)),
        commands: Arc::new(CommandDispatcher::new(
            catalog.clone(),
            store.clone(),
            runtime,
            host,
            config.service_label.clone(),
        )),
        publisher: Publisher::new(reconciler.clone(), config.push_interval),
    };

    let shutdown = CancellationToken::new();
    let sampler = HealthSampler::new(
        reconciler,
        store,
        config.health_sample_interval,
        config.health_retention_days,
    );
    let sampler_task = tokio::spawn(sampler.run(shutdown.clone()));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    if let Err(e) = api::serve::serve(state, shutdown.clone()).await {
        error!("Server exited: {:?}", e);
    }
    shutdown.cancel();
    let _ = sampler_task.await;
    Ok(())
}
