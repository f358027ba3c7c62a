use axum::extract::{OriginalUri, Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::resolver::LocalUser;
use crate::session::{DATA_COOKIE, SIGNATURE_COOKIE};
use crate::{AccessGate, CookieUpdate, Decision};

/// Gate middleware, for `axum::middleware::from_fn_with_state`.
///
/// Allowed requests get a [`CurrentUser<U>`](crate::CurrentUser) in their
/// extensions (read it with the extractor); the same value is mirrored into
/// the response extensions for layers that render views. Denied requests get
/// a 403 login page and never reach the handler.
pub async fn authenticate<U>(
    State(gate): State<AccessGate<U>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response
where
    U: LocalUser,
{
    let target = request_target(
        req.extensions()
            .get::<OriginalUri>()
            .map_or_else(|| req.uri(), |original| &original.0),
    );

    let data = jar.get(DATA_COOKIE).map(|c| c.value().to_owned());
    let signature = jar.get(SIGNATURE_COOKIE).map(|c| c.value().to_owned());

    let outcome = gate
        .authenticate(data.as_deref(), signature.as_deref(), &target)
        .await;
    let jar = apply_cookies(jar, outcome.cookies, gate.config().cookie_path());

    match outcome.decision {
        Decision::Deny { login_page } => {
            (StatusCode::FORBIDDEN, jar, Html(login_page)).into_response()
        }
        Decision::Allow(current) => {
            req.extensions_mut().insert(current.clone());
            let mut response = next.run(req).await;
            response.extensions_mut().insert(current);
            (jar, response).into_response()
        }
    }
}

/// Path and query, as the client sent them.
fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned())
}

fn apply_cookies(jar: CookieJar, update: CookieUpdate, path: &str) -> CookieJar {
    match update {
        CookieUpdate::Keep => jar,
        CookieUpdate::Install(pair) => jar
            .add(session_cookie(DATA_COOKIE, pair.data, path))
            .add(session_cookie(SIGNATURE_COOKIE, pair.signature, path)),
        CookieUpdate::Clear => jar
            .add(removal_cookie(DATA_COOKIE, path))
            .add(removal_cookie(SIGNATURE_COOKIE, path)),
    }
}

// Not http-only: the Userbin client script manages these cookies too.
fn session_cookie(name: &'static str, value: String, path: &str) -> Cookie<'static> {
    Cookie::build((name, value)).path(path.to_owned()).build()
}

fn removal_cookie(name: &'static str, path: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path(path.to_owned()).build();
    cookie.make_removal();
    cookie
}
