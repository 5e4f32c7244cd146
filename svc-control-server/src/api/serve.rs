use std::time::Duration;

use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api::{push, service, services, system};
use crate::response::{ServerError, ServerResult};
use crate::util::app_state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .nest("/services", services::create_route())
        .nest("/service", service::create_route())
        .nest("/system", system::create_route())
        .route("/ready", get(system::get_ready))
        .route("/ws", get(push::handle_status_ws));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
}

/// Router of the dedicated push listener.
pub fn create_ws_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(push::handle_status_ws))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, shutdown: CancellationToken) -> ServerResult<()> {
    let cfg = state.config.clone();

    let rest_listener = TcpListener::bind(cfg.rest_address())
        .await
        .map_err(|e| ServerError::internal_error(&format!("bind REST: {e}")))?;
    info!("HTTP server is listening on {}", cfg.rest_address());

    let ws_listener = TcpListener::bind(cfg.ws_address())
        .await
        .map_err(|e| ServerError::internal_error(&format!("bind WebSocket: {e}")))?;
    info!("WebSocket server is listening on {}", cfg.ws_address());

    let rest_task = tokio::spawn({
        let app = create_router(state.clone());
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = axum::serve(rest_listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                warn!("REST server failed: {e:?}");
            }
        }
    });

    let ws_task = tokio::spawn({
        let app = create_ws_router(state);
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = axum::serve(ws_listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                warn!("WebSocket server failed: {e:?}");
            }
        }
    });

    let _ = tokio::join!(rest_task, ws_task);
    Ok(())
}
