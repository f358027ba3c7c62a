//! The `_ubd` / `_ubs` cookie pair.
//!
//! The two cookies are only meaningful together: the gate reads both, and
//! when it changes them it sets both or clears both.

use crate::SecretString;

/// Session payload cookie.
pub const DATA_COOKIE: &str = "_ubd";

/// Signature cookie, hex HMAC-SHA256 of [`DATA_COOKIE`].
pub const SIGNATURE_COOKIE: &str = "_ubs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookiePair {
    pub data: String,
    pub signature: String,
}

impl SessionCookiePair {
    pub fn new(data: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            signature: signature.into(),
        }
    }

    /// Builds a pair from raw cookie values.
    ///
    /// Returns `None` unless both values are present and non-empty.
    pub fn from_values(data: Option<&str>, signature: Option<&str>) -> Option<Self> {
        let data = data.filter(|v| !v.is_empty())?;
        let signature = signature.filter(|v| !v.is_empty())?;
        Some(Self::new(data, signature))
    }

    /// Signs `data` with `secret`, the way Userbin issues a pair.
    pub fn signed(data: impl Into<String>, secret: &SecretString) -> Self {
        let data = data.into();
        let signature = super::sign(&data, secret);
        Self { data, signature }
    }

    /// Returns true if the signature matches the payload under `secret`.
    pub fn is_valid(&self, secret: &SecretString) -> bool {
        super::validate(&self.data, &self.signature, secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_requires_both() {
        assert!(SessionCookiePair::from_values(Some("d"), Some("s")).is_some());
        assert!(SessionCookiePair::from_values(Some("d"), None).is_none());
        assert!(SessionCookiePair::from_values(None, Some("s")).is_none());
        assert!(SessionCookiePair::from_values(Some(""), Some("s")).is_none());
        assert!(SessionCookiePair::from_values(None, None).is_none());
    }

    #[test]
    fn test_signed_pair_is_valid() {
        let secret = SecretString::new("s3cr3t");
        let pair = SessionCookiePair::signed(r#"{"id":"s1"}"#, &secret);
        assert!(pair.is_valid(&secret));
        assert!(!pair.is_valid(&SecretString::new("other")));
    }
}
