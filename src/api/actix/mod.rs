//! actix-web adapter.
//!
//! [`UserbinGate`] wraps an `App` or a scope; handlers read the result
//! through the [`CurrentUser`](crate::CurrentUser) extractor.

mod extract;
mod middleware;

pub use extract::AuthenticationError;
pub use middleware::{UserbinGate, UserbinGateMiddleware};
