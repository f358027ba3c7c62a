use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::GateError;

/// Converts `GateError` into an HTTP response.
///
/// The gate itself never fails a request; this only surfaces wiring mistakes
/// such as extracting a `CurrentUser` on a route the gate does not cover.
#[derive(Debug)]
pub struct AppError(pub GateError);

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GateError::MissingSession
            | GateError::MalformedSession(_)
            | GateError::InvalidSignature
            | GateError::UnresolvableUser => StatusCode::UNAUTHORIZED,
            GateError::RefreshTransport(_) | GateError::Timeout => StatusCode::BAD_GATEWAY,
            GateError::MissingCredentials | GateError::ConfigurationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.reason(),
        });

        (status, Json(body)).into_response()
    }
}
