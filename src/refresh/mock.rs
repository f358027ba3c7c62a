#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::SessionRefresher;
use crate::{GateError, SessionCookiePair};

/// In-memory refresher returning a canned outcome and recording every call.
#[derive(Clone)]
pub struct MockSessionRefresher {
    outcome: Arc<Mutex<Result<SessionCookiePair, GateError>>>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockSessionRefresher {
    /// A refresher that fails every call.
    pub fn new() -> Self {
        Self::failing(GateError::RefreshTransport(
            "no refresh response configured".to_owned(),
        ))
    }

    pub fn succeeding(pair: SessionCookiePair) -> Self {
        Self::with_outcome(Ok(pair))
    }

    pub fn failing(error: GateError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<SessionCookiePair, GateError>) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            delay: None,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Sleeps before answering, to exercise timeouts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Session ids passed to `refresh`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSessionRefresher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRefresher for MockSessionRefresher {
    async fn refresh(&self, session_id: &str) -> Result<SessionCookiePair, GateError> {
        self.calls.lock().unwrap().push(session_id.to_owned());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.outcome.lock().unwrap().clone()
    }
}
