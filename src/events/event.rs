use chrono::{DateTime, Utc};

/// Events emitted while the gate handles a request.
///
/// Fired unconditionally; without registered listeners they cost nothing.
/// Register listeners via
/// [`register_event_listeners`](crate::register_event_listeners).
#[derive(Debug, Clone)]
pub enum GateEvent {
    /// An expired session was exchanged for a new cookie pair.
    SessionRefreshed {
        session_id: String,
        at: DateTime<Utc>,
    },
    /// The request's session was dropped and its cookies cleared.
    SessionRejected {
        reason: &'static str,
        at: DateTime<Utc>,
    },
    /// The `create_user` hook produced a new local user.
    UserCreated {
        profile_id: String,
        at: DateTime<Utc>,
    },
    /// An anonymous request hit the protected path.
    AccessDenied {
        path: String,
        at: DateTime<Utc>,
    },
}

impl GateEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionRefreshed { .. } => "session.refreshed",
            Self::SessionRejected { .. } => "session.rejected",
            Self::UserCreated { .. } => "user.created",
            Self::AccessDenied { .. } => "access.denied",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionRefreshed { at, .. }
            | Self::SessionRejected { at, .. }
            | Self::UserCreated { at, .. }
            | Self::AccessDenied { at, .. } => *at,
        }
    }
}
