use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::ScriptInjector;

/// Adds the Userbin client script to `text/html` responses.
///
/// Other content types and non-UTF-8 bodies pass through untouched.
pub async fn inject_script(
    State(injector): State<ScriptInjector>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if injector.skips_injection() || !is_html(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!(target: "userbin", "msg=\"failed to buffer html response\" error=\"{e}\"");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body = match std::str::from_utf8(&bytes) {
        Ok(html) => Body::from(injector.inject(html, None)),
        Err(_) => Body::from(bytes),
    };

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, body)
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"))
}
