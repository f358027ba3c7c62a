//! Ready-made listeners; pass them to
//! [`register_event_listeners`](crate::register_event_listeners).

mod logging;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::LoggingListener;
#[cfg(feature = "tracing")]
pub use self::tracing::TracingListener;
