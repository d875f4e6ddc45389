use crate::errors::Error;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body: `{ "message": ..., "error": ... }`
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            message: "Invalid request body".to_string(),
            error: Some(rejection.body_text()),
            code: StatusCode::BAD_REQUEST.as_u16(),
        }
    }
}

/// A path segment that does not parse (e.g. `/users/abc`) names no resource
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError {
            message: "Resource not found".to_string(),
            error: Some(rejection.body_text()),
            code: StatusCode::NOT_FOUND.as_u16(),
        }
    }
}

/// Helper function to create API errors
pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    ApiError {
        message: message.to_string(),
        error: None,
        code: status.as_u16(),
    }
}

/// Converts a domain error into its HTTP form.
///
/// `failure_message` names the operation and is used for persistence failures,
/// whose underlying cause goes into the `error` field.
pub fn from_error(err: Error, failure_message: &str) -> ApiError {
    match err {
        Error::Conflict(message) => {
            warn!("{}: {}", failure_message, message);
            api_error(StatusCode::BAD_REQUEST, &message)
        }
        Error::NotFound(message) => api_error(StatusCode::NOT_FOUND, &message),
        Error::InvalidCredentials => {
            api_error(StatusCode::UNAUTHORIZED, &Error::InvalidCredentials.to_string())
        }
        other => {
            error!("{}: {}", failure_message, other);
            ApiError {
                message: failure_message.to_string(),
                error: Some(other.to_string()),
                code: StatusCode::BAD_REQUEST.as_u16(),
            }
        }
    }
}
