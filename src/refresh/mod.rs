//! Session refresh against the Userbin api.
//!
//! An expired session is exchanged for a fresh `_ubd`/`_ubs` pair with a
//! single `POST {api_endpoint}/sessions/{id}/refresh`. The gate calls the
//! refresher at most once per request and never retries.
//!
//! # Implementations
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpSessionRefresher`] | Talks to the Userbin api with `reqwest` |
//! | [`MockSessionRefresher`] | Canned responses, behind the `mocks` feature |

mod http;
#[cfg(any(test, feature = "mocks"))]
mod mock;

use async_trait::async_trait;

pub use http::{HttpSessionRefresher, SIGNATURE_HEADER};
#[cfg(any(test, feature = "mocks"))]
pub use mock::MockSessionRefresher;

use crate::{GateError, SessionCookiePair};

/// Exchanges an expired session id for a new cookie pair.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Refreshes the session.
    ///
    /// # Errors
    ///
    /// Returns `GateError::RefreshTransport` on a transport failure or a
    /// non-success response, and `GateError::Timeout` if the call timed out.
    async fn refresh(&self, session_id: &str) -> Result<SessionCookiePair, GateError>;
}
