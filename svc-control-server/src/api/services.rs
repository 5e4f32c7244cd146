use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use serde::Deserialize;
use svc_control_shared::Ack;
use svc_control_shared::health::HealthTiles;
use svc_control_shared::settings::ServiceSettings;
use svc_control_shared::status::ServiceStatus;
use tracing::{info, warn};

use crate::control::commands::{RestartOutcome, parse_ignore_list};
use crate::models::settings::to_service_settings;
use crate::response::{ServerAppResult, ServerError, ServerResponse};
use crate::util::app_state::AppState;
use crate::util::health_query::HealthQuery;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/", get(get_services))
        .route("/settings", get(get_all_settings))
        .route("/health", get(get_health))
        .route("/restart", get(restart_services))
        .route("/{verb}", get(unknown_verb))
}

async fn get_services(State(state): State<AppState>) -> ServerAppResult<Vec<ServiceStatus>> {
    info!("Calling /api/v1/services");
    let statuses = state.reconciler.current_statuses().await?;
    Ok(ServerResponse::json(statuses))
}

async fn get_all_settings(State(state): State<AppState>) -> ServerAppResult<Vec<ServiceSettings>> {
    info!("Calling /api/v1/services/settings");
    let mut all = Vec::with_capacity(state.catalog.services.len());
    for def in &state.catalog.services {
        let records = state.store.get_settings(&def.name).await?;
        all.push(to_service_settings(&def.name, &records));
    }
    Ok(ServerResponse::json(all))
}

async fn get_health(
    State(state): State<AppState>,
    query: HealthQuery,
) -> ServerAppResult<HealthTiles> {
    info!(
        from = %query.from,
        to = %query.to,
        view = %query.view,
        "Calling /api/v1/services/health"
    );
    let tiles = state
        .history
        .get_health_tiles(
            query.from,
            query.to,
            query.view,
            query.count,
            query.service.as_deref(),
        )
        .await?;
    Ok(ServerResponse::json(tiles))
}

#[derive(Debug, Deserialize, Default)]
struct RestartParams {
    #[serde(default)]
    ignore: Option<String>,
}

/// Acknowledges immediately; the restarts run in the background.
async fn restart_services(
    State(state): State<AppState>,
    Query(params): Query<RestartParams>,
) -> ServerAppResult<Ack> {
    info!("Calling /api/v1/services/restart");
    let ignore = parse_ignore_list(params.ignore.as_deref().unwrap_or_default());

    let commands = state.commands.clone();
    tokio::spawn(async move {
        let report = commands.restart_all(&ignore).await;
        for (name, outcome) in &report.outcomes {
            if let RestartOutcome::Failed { kind, message } = outcome {
                warn!(service = %name, kind = *kind, "Restart failed: {}", message);
            }
        }
        info!(
            "Restarted services {:?}, {} failed",
            report.restarted().collect::<Vec<_>>(),
            report.failed().count()
        );
    });

    Ok(ServerResponse::json(Ack::ok()))
}

async fn unknown_verb(Path(verb): Path<String>) -> ServerAppResult<()> {
    Err(ServerError::bad_request(&format!(
        "Invalid verb \"{verb}\". Only \"\", \"settings\", \"health\" or \"restart\" are supported."
    )))
}
