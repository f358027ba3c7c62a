use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody, to_bytes};
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Uri;
use actix_web::http::header::{
    CONTENT_LENGTH, CONTENT_TYPE, ContentType, HeaderMap, HeaderValue, SET_COOKIE,
};
use actix_web::web::Bytes;
use actix_web::{HttpMessage, HttpResponse};
use futures::future::{LocalBoxFuture, Ready, ok};

use crate::resolver::LocalUser;
use crate::session::{DATA_COOKIE, SIGNATURE_COOKIE};
use crate::{AccessGate, CookieUpdate, Decision, ScriptInjector};

/// Gate middleware for actix-web.
///
/// Runs the gate before the handler, sets or clears the session cookies on
/// the way out and injects the Userbin script into HTML responses.
///
/// # Example
///
/// ```rust,ignore
/// use userbin::api::actix::UserbinGate;
///
/// let gate = AccessGate::<AppUser>::with_http_refresher(config, resolver)?;
///
/// App::new()
///     .wrap(UserbinGate::new(gate))
///     .route("/admin", web::get().to(dashboard))
/// ```
pub struct UserbinGate<U> {
    gate: AccessGate<U>,
}

impl<U> Clone for UserbinGate<U> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<U: LocalUser> UserbinGate<U> {
    #[must_use]
    pub fn new(gate: AccessGate<U>) -> Self {
        Self { gate }
    }
}

impl<S, B, U> Transform<S, ServiceRequest> for UserbinGate<U>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
    U: LocalUser,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type Transform = UserbinGateMiddleware<S, U>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(UserbinGateMiddleware {
            service: Rc::new(service),
            gate: self.gate.clone(),
        })
    }
}

pub struct UserbinGateMiddleware<S, U> {
    service: Rc<S>,
    gate: AccessGate<U>,
}

impl<S, B, U> Service<ServiceRequest> for UserbinGateMiddleware<S, U>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
    U: LocalUser,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate.clone();

        Box::pin(async move {
            let data = req.cookie(DATA_COOKIE).map(|c| c.value().to_owned());
            let signature = req.cookie(SIGNATURE_COOKIE).map(|c| c.value().to_owned());
            let target = request_target(req.uri());

            let outcome = gate
                .authenticate(data.as_deref(), signature.as_deref(), &target)
                .await;
            let cookie_path = gate.config().cookie_path();

            match outcome.decision {
                Decision::Deny { login_page } => {
                    let mut response = HttpResponse::Forbidden()
                        .content_type(ContentType::html())
                        .body(login_page);
                    apply_cookies(response.headers_mut(), &outcome.cookies, cookie_path);
                    Ok(req.into_response(response))
                }
                Decision::Allow(current) => {
                    req.extensions_mut().insert(current.clone());

                    let res = service.call(req).await?;
                    let mut res = inject_script(gate.injector(), res).await?;

                    apply_cookies(res.headers_mut(), &outcome.cookies, cookie_path);
                    res.response_mut().extensions_mut().insert(current);
                    Ok(res)
                }
            }
        })
    }
}

fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned())
}

fn apply_cookies(headers: &mut HeaderMap, update: &CookieUpdate, path: &str) {
    let cookies = match update {
        CookieUpdate::Keep => return,
        CookieUpdate::Install(pair) => [
            session_cookie(DATA_COOKIE, &pair.data, path),
            session_cookie(SIGNATURE_COOKIE, &pair.signature, path),
        ],
        CookieUpdate::Clear => [
            removal_cookie(DATA_COOKIE, path),
            removal_cookie(SIGNATURE_COOKIE, path),
        ],
    };

    for cookie in cookies {
        match HeaderValue::from_str(&cookie.encoded().to_string()) {
            Ok(value) => headers.append(SET_COOKIE, value),
            Err(e) => {
                log::error!(
                    target: "userbin",
                    "msg=\"invalid cookie header\" cookie=\"{}\" error=\"{e}\"",
                    cookie.name()
                );
            }
        }
    }
}

fn session_cookie<'c>(name: &'c str, value: &'c str, path: &'c str) -> Cookie<'c> {
    Cookie::build(name, value).path(path).finish()
}

fn removal_cookie<'c>(name: &'c str, path: &'c str) -> Cookie<'c> {
    let mut cookie = Cookie::build(name, "").path(path).finish();
    cookie.make_removal();
    cookie
}

async fn inject_script<B>(
    injector: &ScriptInjector,
    res: ServiceResponse<B>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error>
where
    B: MessageBody + 'static,
{
    if injector.skips_injection() || !is_html(res.headers()) {
        return Ok(res.map_into_boxed_body());
    }

    let (req, res) = res.into_parts();
    let (mut head, body) = res.into_parts();

    let bytes = to_bytes(body).await.map_err(|e| {
        let e: Box<dyn std::error::Error> = e.into();
        log::error!(target: "userbin", "msg=\"failed to buffer html response\" error=\"{e}\"");
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;

    let body = match std::str::from_utf8(&bytes) {
        Ok(html) => Bytes::from(injector.inject(html, None)),
        Err(_) => bytes,
    };

    head.headers_mut().remove(CONTENT_LENGTH);
    Ok(ServiceResponse::new(req, head.set_body(body).map_into_boxed_body()))
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"))
}
