use serde::{Deserialize, Deserializer};

use super::SessionRecord;
use crate::GateError;

/// Parses a `_ubd` payload that has already passed the signature check.
///
/// Only structure is checked here; expiry is the gate's business.
///
/// # Errors
///
/// Returns `GateError::MalformedSession` if the payload is not a JSON object
/// with `id`, `expires_at` and a `user` carrying an `id`.
pub fn decode(data: &str) -> Result<SessionRecord, GateError> {
    serde_json::from_str(data).map_err(|e| GateError::MalformedSession(e.to_string()))
}

/// Userbin ids are strings, but numeric ids are accepted and stringified.
pub(super) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_decode_session() {
        let record = decode(
            r#"{"id":"s1","expires_at":9999999999999,"user":{"id":"u1","email":"ada@example.com"}}"#,
        )
        .unwrap();

        assert_eq!(record.id, "s1");
        assert_eq!(record.expires_at, 9_999_999_999_999);
        assert_eq!(record.profile.id, "u1");
        assert_eq!(
            record.profile.attribute("email"),
            Some(&Value::from("ada@example.com"))
        );
    }

    #[test]
    fn test_decode_numeric_ids() {
        let record = decode(r#"{"id":42,"expires_at":1,"user":{"id":7}}"#).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.profile.id, "7");
    }

    #[test]
    fn test_decode_ignores_unknown_session_fields() {
        let record =
            decode(r#"{"id":"s1","expires_at":1,"created_at":0,"user":{"id":"u1"}}"#).unwrap();
        assert_eq!(record.id, "s1");
    }

    #[test]
    fn test_decode_malformed() {
        for data in [
            "",
            "not json",
            "[]",
            r#"{"id":"s1"}"#,
            r#"{"id":"s1","expires_at":"soon","user":{"id":"u1"}}"#,
            r#"{"id":"s1","expires_at":1,"user":{}}"#,
            r#"{"id":"s1","expires_at":1,"user":{"id":"u1"}"#,
        ] {
            assert!(
                matches!(decode(data), Err(GateError::MalformedSession(_))),
                "expected malformed: {data}"
            );
        }
    }
}
