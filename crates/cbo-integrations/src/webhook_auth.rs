//! Callback authentication helpers
//!
//! Both checks compare HMAC-SHA256 tags with [`Mac::verify_slice`] (constant time).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(key).unwrap_or_else(|_| unreachable!("HMAC takes any key size"))
}

/// Hex HMAC-SHA256 of `body` under `secret`
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut m = mac(secret.as_bytes());
    m.update(body);
    hex::encode(m.finalize().into_bytes())
}

/// Check a hex HMAC-SHA256 signature of `body`
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut m = mac(secret.as_bytes());
    m.update(body);
    m.verify_slice(&signature).is_ok()
}

/// Compare a presented shared token with the configured one.
///
/// Both values are MACed under the expected token and the tags compared, which hides both
/// content and length differences.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let mut reference = mac(expected.as_bytes());
    reference.update(expected.as_bytes());
    let tag = reference.finalize().into_bytes();

    let mut candidate = mac(expected.as_bytes());
    candidate.update(presented.as_bytes());
    candidate.verify_slice(&tag).is_ok()
}
