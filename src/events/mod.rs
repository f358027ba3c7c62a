//! Gate events.
//!
//! The gate fires an event whenever it refreshes a session, rejects one,
//! creates a user through the `create_user` hook, or denies a request. If no
//! listeners are registered, events are dropped.
//!
//! ```rust,ignore
//! use userbin::register_event_listeners;
//! use userbin::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Implement [`Listener`] for anything else, e.g. counting denials:
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use userbin::events::{GateEvent, Listener};
//!
//! struct DenialCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Listener for DenialCounter {
//!     async fn handle(&self, event: &GateEvent) {
//!         if let GateEvent::AccessDenied { .. } = event {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::GateEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
