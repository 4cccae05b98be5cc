//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute HMAC-SHA256 over `data`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Produce `"<value>.<base64url(hmac)>"`.
pub fn sign_value(key: &[u8], value: &str) -> String {
    let tag = hmac_sha256(key, value.as_bytes());
    format!("{}.{}", value, URL_SAFE_NO_PAD.encode(tag))
}

/// Verify a value produced by [`sign_value`] and return the inner value.
///
/// The tag comparison is constant-time.
pub fn verify_signed_value<'a>(key: &[u8], signed: &'a str) -> Option<&'a str> {
    let (value, tag_b64) = signed.rsplit_once('.')?;
    let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;

    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).ok()?;
    mac.update(value.as_bytes());
    mac.verify_slice(&tag).ok()?;

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        let expected =
            hex::decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
                .unwrap();
        assert_eq!(mac.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_signed_value_accepts_own_signature() {
        let signed = sign_value(b"secret", "b1946ac9-2b1c-4d4b-9f0e-5d2b9a1f6a11");
        assert_eq!(
            verify_signed_value(b"secret", &signed),
            Some("b1946ac9-2b1c-4d4b-9f0e-5d2b9a1f6a11")
        );
    }

    #[test]
    fn test_signed_value_rejects_other_key_and_tampering() {
        let signed = sign_value(b"secret", "abc");
        assert_eq!(verify_signed_value(b"other", &signed), None);

        let tampered = signed.replacen("abc", "abd", 1);
        assert_eq!(verify_signed_value(b"secret", &tampered), None);

        assert_eq!(verify_signed_value(b"secret", "no-dot-here"), None);
        assert_eq!(verify_signed_value(b"secret", "abc.!!!"), None);
    }
}
