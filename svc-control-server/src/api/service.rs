use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use svc_control_shared::Ack;
use svc_control_shared::settings::{
    EnabledState, SERVICE_ENABLED, ServiceSettings, SettingValue, UpdateSettingBody, flag_value,
};
use tracing::info;

use crate::models::settings::to_service_settings;
use crate::response::{ServerAppResult, ServerError, ServerResponse};
use crate::util::app_state::AppState;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/{name}/enable", get(enable_service))
        .route("/{name}/disable", get(disable_service))
        .route("/{name}/restart", get(restart_service))
        .route("/{name}/enabled", get(get_enabled))
        .route("/{name}/settings", get(get_service_settings))
        .route(
            "/{name}/settings/{setting}",
            get(get_service_setting).put(update_service_setting),
        )
        .route("/{name}/{verb}", get(unknown_verb))
}

async fn enable_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerAppResult<Ack> {
    info!("Calling /api/v1/service/{}/enable", name);
    state.commands.enable(&name).await?;
    Ok(ServerResponse::json(Ack::ok()))
}

async fn disable_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerAppResult<Ack> {
    info!("Calling /api/v1/service/{}/disable", name);
    state.commands.disable(&name).await?;
    Ok(ServerResponse::json(Ack::ok()))
}

async fn restart_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerAppResult<Ack> {
    info!("Calling /api/v1/service/{}/restart", name);
    state.commands.restart(&name).await?;
    Ok(ServerResponse::json(Ack::ok()))
}

async fn get_enabled(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerAppResult<EnabledState> {
    info!("Calling /api/v1/service/{}/enabled", name);
    let records = state.store.get_settings(&name).await?;
    let enabled = records
        .iter()
        .find(|r| r.name == SERVICE_ENABLED)
        .is_some_and(|r| flag_value(&r.value));
    Ok(ServerResponse::json(EnabledState { enabled }))
}

async fn get_service_settings(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerAppResult<ServiceSettings> {
    info!("Calling /api/v1/service/{}/settings", name);
    let records = state.store.get_settings(&name).await?;
    Ok(ServerResponse::json(to_service_settings(&name, &records)))
}

async fn get_service_setting(
    State(state): State<AppState>,
    Path((name, setting)): Path<(String, String)>,
) -> ServerAppResult<SettingValue> {
    info!("Calling /api/v1/service/{}/settings/{}", name, setting);
    let record = state.store.get_setting(&name, &setting).await?;
    Ok(ServerResponse::json(SettingValue::from(&record)))
}

async fn update_service_setting(
    State(state): State<AppState>,
    Path((name, setting)): Path<(String, String)>,
    Json(body): Json<UpdateSettingBody>,
) -> ServerAppResult<SettingValue> {
    info!("Updating /api/v1/service/{}/settings/{}", name, setting);
    let record = state.store.get_setting(&name, &setting).await?;
    if !record.editable {
        return Err(ServerError::not_supported(&format!(
            "setting {setting} of service {name} is not editable"
        )));
    }
    state
        .store
        .set_setting_value(&name, &setting, &body.value)
        .await?;
    Ok(ServerResponse::json(SettingValue {
        name: setting,
        value: body.value,
    }))
}

/// Unknown services are reported before unknown verbs.
async fn unknown_verb(
    State(state): State<AppState>,
    Path((name, verb)): Path<(String, String)>,
) -> ServerAppResult<()> {
    info!("Calling /api/v1/service/{}/{}", name, verb);
    state.store.require_service_id(&name).await?;
    Err(ServerError::bad_request(&format!(
        "Invalid action \"{verb}\". Not supported."
    )))
}
