//! Component B: the protocol-version + HMAC-SHA1 challenge/response
//! handshake described in spec §4.2/§6. An empty `AUTH_KEY` disables the
//! challenge step entirely (spec §3, §6).

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use thiserror::Error;

pub const NONCE_LEN: usize = 32;
pub const DIGEST_LEN: usize = 20;

type HmacSha1 = Hmac<Sha1>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authentication failed")]
    Failed,
    #[error("HMAC key of invalid length")]
    BadKey,
}

/// An authentication key. An empty key disables authentication.
#[derive(Clone)]
pub struct AuthKey(Vec<u8>);

impl AuthKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }
}

impl From<&str> for AuthKey {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Draw a fresh nonce from the OS CSPRNG (spec §6: "must be drawn from a
/// cryptographic RNG").
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Compute `HMAC-SHA1(key, nonce)`, the `AuthResponse` digest.
pub fn compute_response(key: &AuthKey, nonce: &[u8; NONCE_LEN]) -> [u8; DIGEST_LEN] {
    // HMAC accepts keys of any length (it hashes down oversized keys itself),
    // so `new_from_slice` never fails here.
    let mut mac = HmacSha1::new_from_slice(&key.0).expect("HMAC accepts any key length");
    mac.update(nonce);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&result);
    out
}

/// Constant-time verification of a received `AuthResponse` digest.
pub fn verify_response(key: &AuthKey, nonce: &[u8; NONCE_LEN], digest: &[u8; DIGEST_LEN]) -> Result<(), AuthError> {
    let mut mac = HmacSha1::new_from_slice(&key.0).map_err(|_| AuthError::BadKey)?;
    mac.update(nonce);
    mac.verify_slice(digest).map_err(|_| AuthError::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc_style_vector_from_spec_scenario_2() {
        // spec §8 scenario 2: key="secret", nonce = 32 zero bytes.
        let key = AuthKey::from("secret");
        let nonce = [0u8; NONCE_LEN];
        let digest = compute_response(&key, &nonce);
        let expect: [u8; 20] = [
            0xd9, 0xe0, 0x6d, 0x6b, 0xff, 0xe7, 0xb2, 0x6a, 0x5c, 0x64,
            0x46, 0xbb, 0x7b, 0x8e, 0xdc, 0x0c, 0x2d, 0x87, 0xdc, 0x0c,
        ];
        assert_eq!(digest, expect);
        assert!(verify_response(&key, &nonce, &digest).is_ok());
    }

    #[test]
    fn bit_flip_fails_verification() {
        let key = AuthKey::from("secret");
        let nonce = generate_nonce();
        let mut digest = compute_response(&key, &nonce);
        digest[0] ^= 0x01;
        assert!(verify_response(&key, &nonce, &digest).is_err());
    }

    #[test]
    fn empty_key_still_computes_deterministically() {
        let key = AuthKey::from("");
        assert!(!key.is_enabled());
        let nonce = generate_nonce();
        let digest = compute_response(&key, &nonce);
        assert!(verify_response(&key, &nonce, &digest).is_ok());
    }
}
