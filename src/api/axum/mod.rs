//! axum adapter.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use userbin::api::axum::protect;
//!
//! let app = protect(Router::new().route("/admin", get(handler)), gate);
//! ```
//!
//! [`protect`] installs both layers in the right order. To wire them by hand,
//! the gate must wrap the script injector so the 403 login page is not
//! injected twice:
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let app = router
//!     .layer(from_fn_with_state(gate.injector().clone(), inject_script))
//!     .layer(from_fn_with_state(gate.clone(), authenticate::<AppUser>));
//! ```

mod error;
mod extract;
mod inject;
mod middleware;

use axum::Router;
use axum::middleware::from_fn_with_state;

pub use error::AppError;
pub use inject::inject_script;
pub use middleware::authenticate;

use crate::AccessGate;
use crate::resolver::LocalUser;

/// Puts `router` behind the gate, with script injection into HTML responses.
pub fn protect<S, U>(router: Router<S>, gate: AccessGate<U>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    U: LocalUser,
{
    let injector = gate.injector().clone();
    router
        .layer(from_fn_with_state(injector, inject_script))
        .layer(from_fn_with_state(gate, authenticate::<U>))
}
