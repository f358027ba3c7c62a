use async_trait::async_trait;

use crate::events::{GateEvent, Listener};

/// Writes one `key=value` line per gate event to the `log` facade.
///
/// Rejections and denials are never logged below `Warn`; everything else uses
/// the configured level.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &GateEvent) -> log::Level {
        match event {
            GateEvent::SessionRejected { .. } | GateEvent::AccessDenied { .. } => {
                self.level.min(log::Level::Warn)
            }
            _ => self.level,
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

fn line(event: &GateEvent) -> String {
    let detail = match event {
        GateEvent::SessionRefreshed { session_id, .. } => format!("session_id=\"{session_id}\""),
        GateEvent::SessionRejected { reason, .. } => format!("reason=\"{reason}\""),
        GateEvent::UserCreated { profile_id, .. } => format!("profile_id=\"{profile_id}\""),
        GateEvent::AccessDenied { path, .. } => format!("path=\"{path}\""),
    };
    format!(
        "event={} {detail} at=\"{}\"",
        event.name(),
        event.timestamp().to_rfc3339()
    )
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &GateEvent) {
        log::log!(target: "userbin::events", self.level_for(event), "{}", line(event));
    }
}
