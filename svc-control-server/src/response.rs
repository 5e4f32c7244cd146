use axum::{
    http::header::CONTENT_TYPE,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug)]
pub struct ServerResponse<T: Serialize> {
    pub body: Option<T>,
    pub headers: HeaderMap,
    pub status_code: StatusCode,
}

#[derive(Debug)]
pub struct ServerResponseBuilder<T: Serialize> {
    pub body: Option<T>,
    pub headers: Option<HeaderMap>,
    pub status_code: Option<StatusCode>,
}

impl<T> ServerResponseBuilder<T>
where
    T: Serialize,
{
    pub fn body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn ok(mut self) -> Self {
        self.status_code = Some(StatusCode::OK);
        self
    }

    pub fn build(self) -> ServerResponse<T> {
        ServerResponse {
            body: self.body,
            headers: self.headers.unwrap_or_default(),
            status_code: self.status_code.unwrap_or(StatusCode::OK),
        }
    }

    pub fn new() -> Self {
        Self {
            body: None,
            headers: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> ServerResponse<T> {
    pub fn builder() -> ServerResponseBuilder<T> {
        ServerResponseBuilder::new()
    }

    /// Shorthand for a `200 OK` JSON body.
    pub fn json(body: T) -> Self {
        Self::builder().body(body).ok().build()
    }
}

impl<T: Serialize> IntoResponse for ServerResponse<T> {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(body) => body,
            None => return self.status_code.into_response(),
        };

        let bytes = match serde_json::to_vec(&body) {
            Ok(b) => b,
            Err(err) => {
                error!("Error serializing response body: {:?}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut headers = self.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        (self.status_code, headers, bytes).into_response()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("Settings store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    #[error("Service {0} not known")]
    UnknownService(String),
    #[error("Setting {setting} not known for service {service}")]
    UnknownSetting { service: String, setting: String },
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),
    #[error("No container found for service {0}")]
    ContainerNotFound(String),
    #[error("No rows affected: {0}")]
    NoRowsAffected(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<sqlx::Error> for ServerError {
    fn from(error: sqlx::Error) -> Self {
        ServerError::StoreUnavailable(error.to_string())
    }
}

impl From<bollard::errors::Error> for ServerError {
    fn from(error: bollard::errors::Error) -> Self {
        ServerError::RuntimeUnavailable(error.to_string())
    }
}

impl ServerError {
    pub fn bad_request(message: &str) -> Self {
        ServerError::BadRequest(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        ServerError::InternalError(message.to_string())
    }

    pub fn unknown_service(name: &str) -> Self {
        ServerError::UnknownService(name.to_string())
    }

    pub fn unknown_setting(service: &str, setting: &str) -> Self {
        ServerError::UnknownSetting {
            service: service.to_string(),
            setting: setting.to_string(),
        }
    }

    pub fn not_supported(message: &str) -> Self {
        ServerError::OperationNotSupported(message.to_string())
    }

    /// Stable identifier clients can match on.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::StoreUnavailable(_) => "StoreUnavailable",
            ServerError::RuntimeUnavailable(_) => "RuntimeUnavailable",
            ServerError::UnknownService(_) => "UnknownService",
            ServerError::UnknownSetting { .. } => "UnknownSetting",
            ServerError::OperationNotSupported(_) => "OperationNotSupported",
            ServerError::ContainerNotFound(_) => "ContainerNotFound",
            ServerError::NoRowsAffected(_) => "NoRowsAffected",
            ServerError::BadRequest(_) => "BadRequest",
            ServerError::InternalError(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::StoreUnavailable(_) | ServerError::RuntimeUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::NoRowsAffected(_) | ServerError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::UnknownService(_)
            | ServerError::UnknownSetting { .. }
            | ServerError::ContainerNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::OperationNotSupported(_) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&ServerError> for ErrorBody {
    fn from(error: &ServerError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Returning error response {} {}", status, self);

        ServerResponse::<ErrorBody>::builder()
            .body(ErrorBody::from(&self))
            .status_code(status)
            .build()
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
pub type ServerAppResult<T> = Result<ServerResponse<T>, ServerError>;
