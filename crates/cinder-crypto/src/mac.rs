//! Envelope integrity tag (HMAC-SHA-256)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;

use crate::keys::KEY_SIZE;

/// Compute the encoded tag over the canonical envelope message.
pub(crate) fn compute_tag(integrity_key: &[u8; KEY_SIZE], message: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, integrity_key);
    STANDARD.encode(hmac::sign(&key, message).as_ref())
}

/// Recompute the tag and compare it against `expected` in constant time.
pub(crate) fn verify_tag(integrity_key: &[u8; KEY_SIZE], message: &[u8], expected: &str) -> bool {
    let actual = compute_tag(integrity_key, message);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

/// Byte-wise OR of XORs.
///
/// The length check exits early, which leaks length. Both operands are
/// encoded fixed-size MAC outputs here; do not reuse this for variable-length
/// secrets.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
