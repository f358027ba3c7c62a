use async_trait::async_trait;

use super::GateEvent;

/// Receives every [`GateEvent`].
///
/// Listeners run inline on the request that fired the event, so slow work
/// belongs on a spawned task.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &GateEvent);
}
