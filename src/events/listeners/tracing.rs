use async_trait::async_trait;

use crate::events::{GateEvent, Listener};

/// Emits gate events as `tracing` events with one field per event attribute.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &GateEvent) {
        let name = event.name();
        match event {
            GateEvent::SessionRefreshed { session_id, at } => {
                tracing::info!(target: "userbin::events", event = name, %session_id, %at);
            }
            GateEvent::SessionRejected { reason, at } => {
                tracing::warn!(target: "userbin::events", event = name, reason, %at);
            }
            GateEvent::UserCreated { profile_id, at } => {
                tracing::info!(target: "userbin::events", event = name, %profile_id, %at);
            }
            GateEvent::AccessDenied { path, at } => {
                tracing::warn!(target: "userbin::events", event = name, %path, %at);
            }
        }
    }
}
