//! HMAC-SHA256 signatures over the raw `_ubd` payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::SecretString;

type HmacSha256 = Hmac<Sha256>;

/// Signs a payload, returning the lowercase hex digest Userbin puts in `_ubs`.
pub fn sign(data: &str, secret: &SecretString) -> String {
    hex::encode(compute_hmac(data.as_bytes(), secret.expose_secret().as_bytes()))
}

/// Checks `signature` against the HMAC of the unparsed `data` string.
///
/// Returns false for an empty secret. The comparison runs in constant time.
pub fn validate(data: &str, signature: &str, secret: &SecretString) -> bool {
    if secret.is_empty() {
        return false;
    }

    let expected = sign(data, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Computes HMAC-SHA256.
///
/// # Panics
///
/// This function cannot panic as HMAC accepts keys of any size.
fn compute_hmac(message: &[u8], key: &[u8]) -> Vec<u8> {
    // SAFETY: new_from_slice only rejects invalid key lengths and HMAC has none.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
