//! Keyed-hash helpers shared by credential and gateway signing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute `base64(HMAC-SHA256(key, message))`.
pub fn hmac_sha256_base64(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check a base64-encoded HMAC-SHA256 signature in constant time.
///
/// Returns `false` for signatures that are not valid base64.
pub fn verify_hmac_sha256_base64(key: &[u8], message: &[u8], signature: &str) -> bool {
    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(&provided).is_ok()
}

/// Compare two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_matches() {
        // RFC 4231 test case 2.
        let sig = hmac_sha256_base64(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(sig, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn verify_accepts_own_signature() {
        let sig = hmac_sha256_base64(b"key", b"payload");
        assert!(verify_hmac_sha256_base64(b"key", b"payload", &sig));
    }

    #[test]
    fn verify_rejects_other_key_or_payload() {
        let sig = hmac_sha256_base64(b"key", b"payload");
        assert!(!verify_hmac_sha256_base64(b"other", b"payload", &sig));
        assert!(!verify_hmac_sha256_base64(b"key", b"payload2", &sig));
    }

    #[test]
    fn verify_rejects_non_base64() {
        assert!(!verify_hmac_sha256_base64(b"key", b"payload", "%%%not-base64"));
    }

    #[test]
    fn constant_time_eq_behaves_like_eq() {
        assert!(constant_time_eq(b"123456", b"123456"));
        assert!(!constant_time_eq(b"123456", b"123457"));
        assert!(!constant_time_eq(b"12345", b"123456"));
    }
}
