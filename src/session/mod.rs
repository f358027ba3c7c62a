//! Userbin session cookies: signature checks, payload decoding and the
//! cookie pair itself.

mod cookie;
mod decoder;
mod signature;

use chrono::{DateTime, Utc};
pub use cookie::{DATA_COOKIE, SIGNATURE_COOKIE, SessionCookiePair};
pub use decoder::decode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use signature::{sign, validate};

/// Identity as asserted by Userbin.
///
/// Not yet trusted as an application user; [`UserResolver`](crate::UserResolver)
/// turns it into one. Anything besides `id` is kept in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProfile {
    #[serde(deserialize_with = "decoder::string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RemoteProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Returns a profile attribute such as `email`.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// A decoded `_ubd` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionRecord {
    #[serde(deserialize_with = "decoder::string_or_number")]
    pub id: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
    #[serde(rename = "user")]
    pub profile: RemoteProfile,
}

impl SessionRecord {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expired iff `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at
    }
}
