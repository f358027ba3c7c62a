//! Framework adapters.
//!
//! Each adapter reads the `_ubd`/`_ubs` cookies, runs
//! [`AccessGate::authenticate`](crate::AccessGate::authenticate), writes the
//! resulting cookie changes, and either answers 403 or hands the request on
//! with a [`CurrentUser`](crate::CurrentUser) in its extensions.

#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "axum_api")]
pub mod axum;
