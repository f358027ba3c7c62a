use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures::future::{Ready, ready};
use serde_json::json;

use crate::{CurrentUser, GateError};

/// Wraps `GateError` so it can be returned from actix handlers.
#[derive(Debug)]
pub struct AuthenticationError {
    pub error: GateError,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl From<GateError> for AuthenticationError {
    fn from(error: GateError) -> Self {
        Self { error }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": self.error.to_string(),
            "code": self.error.reason(),
        });

        match &self.error {
            GateError::MissingSession
            | GateError::MalformedSession(_)
            | GateError::InvalidSignature
            | GateError::UnresolvableUser => HttpResponse::Unauthorized().json(body),
            GateError::RefreshTransport(_) | GateError::Timeout => {
                HttpResponse::BadGateway().json(body)
            }
            GateError::MissingCredentials | GateError::ConfigurationError(_) => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

/// Reads the user [`UserbinGate`](super::UserbinGate) attached to the request.
impl<U: Clone + 'static> FromRequest for CurrentUser<U> {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let current = req.extensions().get::<CurrentUser<U>>().cloned();

        ready(current.ok_or_else(|| {
            GateError::ConfigurationError("userbin gate middleware is not installed".to_owned())
                .into()
        }))
    }
}
