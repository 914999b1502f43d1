//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ServiceError;
use serde_json::{Map, Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No or unknown bearer token.
    Unauthenticated(String),
    /// Malformed request that never reached a service.
    BadRequest(String),
    /// Error returned by a domain service.
    Service(ServiceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::InsufficientCapacity { .. } => StatusCode::CONFLICT,
                ServiceError::Unauthorized(_) => StatusCode::FORBIDDEN,
                ServiceError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
                ServiceError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::BadRequest(_) => "validation_error",
            ApiError::Service(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let mut body = Map::new();
        match &self {
            ApiError::Unauthenticated(msg) | ApiError::BadRequest(msg) => {
                body.insert("error".into(), json!(msg));
            }
            ApiError::Service(err) => {
                if err.is_incident() {
                    tracing::error!(code, error = %err, "request failed");
                }
                body.insert("error".into(), json!(err.to_string()));
                match err {
                    ServiceError::InsufficientCapacity {
                        requested,
                        available,
                        ..
                    } => {
                        body.insert("requested".into(), json!(requested));
                        body.insert("available".into(), json!(available));
                    }
                    ServiceError::InvalidStateTransition { current, .. } => {
                        body.insert("current_status".into(), json!(current));
                    }
                    _ => {}
                }
            }
        }
        body.insert("code".into(), json!(code));

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Parses a path or body identifier, reporting which field was malformed.
pub fn parse_id<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}
