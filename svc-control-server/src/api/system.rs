use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use svc_control_shared::{Ack, ReadyState};
use tracing::{info, warn};

use crate::response::{ServerAppResult, ServerError, ServerResponse};
use crate::util::app_state::AppState;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/restart", get(restart_system))
        .route("/{verb}", get(unknown_verb))
}

/// Fire and forget: the host may go down before the response is read.
async fn restart_system(State(state): State<AppState>) -> ServerAppResult<Ack> {
    info!("Calling /api/v1/system/restart");
    state.commands.restart_host().await?;
    Ok(ServerResponse::json(Ack::ok()))
}

async fn unknown_verb(Path(verb): Path<String>) -> ServerAppResult<()> {
    Err(ServerError::bad_request(&format!(
        "Invalid verb \"{verb}\". Only \"restart\" is supported."
    )))
}

/// Liveness probe; a store that does not answer reports `ready: false`.
pub async fn get_ready(State(state): State<AppState>) -> ServerAppResult<ReadyState> {
    info!("Calling /api/v1/ready");
    let ready = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Readiness probe failed: {}", e);
            false
        }
    };
    Ok(ServerResponse::json(ReadyState { ready }))
}
