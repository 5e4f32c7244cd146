use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use svc_control_shared::health::HealthView;

use crate::response::ServerError;
use crate::util::time::de_opt_date_or_rfc3339;

#[derive(Debug, Clone, Deserialize, Default)]
struct HealthParams {
    #[serde(default, deserialize_with = "de_opt_date_or_rfc3339")]
    from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_date_or_rfc3339")]
    to: Option<DateTime<Utc>>,
    #[serde(default)]
    view: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    service: Option<String>,
}

/// Query of `GET /services/health` with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub view: HealthView,
    pub count: Option<u32>,
    pub service: Option<String>,
}

impl HealthQuery {
    fn resolve(params: HealthParams, now: DateTime<Utc>) -> Result<Self, ServerError> {
        let view = match params.view.as_deref().map(str::trim) {
            None | Some("") => HealthView::default(),
            Some(v) => v.parse::<HealthView>().map_err(ServerError::BadRequest)?,
        };
        if params.count == Some(0) {
            return Err(ServerError::bad_request("count must be greater than zero"));
        }

        let to = params.to.unwrap_or(now);
        let from = params
            .from
            .unwrap_or_else(|| to - Duration::seconds(view.nominal_seconds()));

        Ok(Self {
            from,
            to,
            view,
            count: params.count,
            service: params.service.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl<S> FromRequestParts<S> for HealthQuery
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HealthParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        Self::resolve(params, Utc::now())
    }
}
