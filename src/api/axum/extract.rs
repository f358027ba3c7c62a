use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AppError;
use crate::{CurrentUser, GateError};

/// Reads the user the gate attached to the request.
///
/// Rejects with a 500 if the route is not behind
/// [`authenticate`](super::authenticate).
impl<S, U> FromRequestParts<S> for CurrentUser<U>
where
    S: Send + Sync,
    U: Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser<U>>()
            .cloned()
            .ok_or_else(|| {
                AppError(GateError::ConfigurationError(
                    "userbin gate middleware is not installed".to_owned(),
                ))
            })
    }
}
