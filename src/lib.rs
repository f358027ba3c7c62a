//! Cookie session middleware for the Userbin identity service.
//!
//! A request carries two cookies issued by Userbin: `_ubd` (the session
//! payload) and `_ubs` (its HMAC-SHA256 signature). [`AccessGate`] checks the
//! signature, refreshes expired sessions against the remote service, maps the
//! remote profile onto a local user through [`UserResolver`] hooks, and denies
//! anonymous requests under the configured protected path.
//!
//! # Quick Start (axum)
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use userbin::{AccessGate, CurrentUser, GateConfig, RemoteProfile, UserResolver};
//!
//! async fn dashboard(current: CurrentUser<RemoteProfile>) -> String {
//!     match current.user() {
//!         Some(profile) => format!("hello {}", profile.id),
//!         None => "hello stranger".to_owned(),
//!     }
//! }
//!
//! let config = GateConfig::from_env().with_protected_path("/admin");
//! let gate = AccessGate::with_http_refresher(config, UserResolver::new())?;
//!
//! let app = userbin::api::axum::protect(
//!     Router::new().route("/admin", get(dashboard)),
//!     gate,
//! );
//! ```

use std::fmt;

pub mod api;
pub mod config;
pub mod events;
pub mod gate;
pub mod inject;
pub mod refresh;
pub mod resolver;
mod secret;
pub mod session;

pub use config::GateConfig;
pub use events::register_event_listeners;
pub use gate::{AccessGate, CookieUpdate, CurrentUser, Decision, Outcome};
pub use inject::ScriptInjector;
#[cfg(any(test, feature = "mocks"))]
pub use refresh::MockSessionRefresher;
pub use refresh::{HttpSessionRefresher, SessionRefresher};
pub use resolver::{CreateUser, FindUser, LocalUser, Lookup, UserResolver};
pub use secret::SecretString;
pub use session::{RemoteProfile, SessionCookiePair, SessionRecord};

/// Everything that can go wrong while authenticating a single request.
///
/// None of these are fatal: the gate recovers from each of them by treating
/// the request as anonymous (see [`AccessGate::authenticate`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// `app_id` or `api_secret` is not configured.
    MissingCredentials,
    /// The request carried no session cookies, or only one of them.
    MissingSession,
    /// The session payload is not a well-formed session record.
    MalformedSession(String),
    /// The `_ubs` cookie does not match the HMAC of the `_ubd` cookie.
    InvalidSignature,
    /// The refresh call failed in transit or the service rejected it.
    RefreshTransport(String),
    /// `find_user` found nothing and no `create_user` hook is configured.
    UnresolvableUser,
    /// A refresh call or a resolver hook did not finish in time.
    Timeout,
    ConfigurationError(String),
}

impl GateError {
    /// Short machine-friendly reason, used in logs and events.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::MissingSession => "missing_session",
            Self::MalformedSession(_) => "malformed_session",
            Self::InvalidSignature => "invalid_signature",
            Self::RefreshTransport(_) => "refresh_failed",
            Self::UnresolvableUser => "unresolvable_user",
            Self::Timeout => "timeout",
            Self::ConfigurationError(_) => "configuration_error",
        }
    }
}

impl std::error::Error for GateError {}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::MissingCredentials => write!(f, "appId and apiSecret must be present"),
            GateError::MissingSession => write!(f, "No session cookies present"),
            GateError::MalformedSession(msg) => write!(f, "Malformed session payload: {msg}"),
            GateError::InvalidSignature => write!(f, "Invalid session signature"),
            GateError::RefreshTransport(msg) => write!(f, "Session refresh failed: {msg}"),
            GateError::UnresolvableUser => write!(
                f,
                "findUser returned no user and no createUser hook is configured"
            ),
            GateError::Timeout => write!(f, "Operation timed out"),
            GateError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}
