//! Key material for note envelopes
//!
//! Both acquisition modes funnel into one shape: a 64-byte secret split
//! positionally into a cipher key (first half) and an integrity key (second
//! half). One random draw, or one PBKDF2 call, yields both keys.
//!
//! Everything here is wrapped in `Zeroizing<>` and scrubbed on drop.

use std::num::NonZeroU32;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::{CodecError, Result};

/// Master secret size (cipher key || integrity key)
pub const SECRET_SIZE: usize = 64;
/// 256-bit subkeys
pub const KEY_SIZE: usize = 32;
/// 128-bit PBKDF2 salt
pub const SALT_SIZE: usize = 16;
/// AES block-sized IV
pub const IV_SIZE: usize = 16;

/// PBKDF2 rounds used when sealing
pub const DEFAULT_ITERATIONS: u32 = 150_000;
/// Envelopes claiming fewer rounds are refused
pub const MIN_ITERATIONS: u32 = 150_000;
/// Upper bound so a forged envelope cannot pin a CPU
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Cipher key + integrity key, derived from one 64-byte secret.
pub struct KeyMaterial {
    cipher_key: Zeroizing<[u8; KEY_SIZE]>,
    integrity_key: Zeroizing<[u8; KEY_SIZE]>,
}

impl KeyMaterial {
    /// Split a random master secret (link mode).
    pub fn from_random_secret(secret: &[u8; SECRET_SIZE]) -> Self {
        let mut cipher_key = Zeroizing::new([0u8; KEY_SIZE]);
        let mut integrity_key = Zeroizing::new([0u8; KEY_SIZE]);
        cipher_key.copy_from_slice(&secret[..KEY_SIZE]);
        integrity_key.copy_from_slice(&secret[KEY_SIZE..]);
        Self {
            cipher_key,
            integrity_key,
        }
    }

    /// Derive the master secret from a password with PBKDF2-HMAC-SHA-256,
    /// then split it (password mode).
    pub fn from_password(password: &str, salt: &[u8], iterations: u32) -> Result<Self> {
        let rounds = NonZeroU32::new(iterations).ok_or(CodecError::Integrity)?;
        let mut secret = Zeroizing::new([0u8; SECRET_SIZE]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            rounds,
            salt,
            password.as_bytes(),
            &mut secret[..],
        );
        Ok(Self::from_random_secret(&secret))
    }

    /// Rebuild key material from the encoded secret carried in a share link.
    ///
    /// A key that does not decode to exactly 64 bytes is reported as an
    /// integrity failure, same as a well-formed but wrong key.
    pub fn from_share_key(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(encoded.trim().trim_end_matches('='))
                .map_err(|_| CodecError::Integrity)?,
        );
        let secret: Zeroizing<[u8; SECRET_SIZE]> = Zeroizing::new(
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| CodecError::Integrity)?,
        );
        Ok(Self::from_random_secret(&secret))
    }

    pub fn cipher_key(&self) -> &[u8; KEY_SIZE] {
        &self.cipher_key
    }

    pub fn integrity_key(&self) -> &[u8; KEY_SIZE] {
        &self.integrity_key
    }
}

/// Fresh random master secret for link mode.
pub fn generate_secret() -> Result<Zeroizing<[u8; SECRET_SIZE]>> {
    let mut secret = Zeroizing::new([0u8; SECRET_SIZE]);
    fill_random(&mut secret[..])?;
    Ok(secret)
}

/// Encode a master secret for the link fragment.
pub fn encode_share_key(secret: &[u8; SECRET_SIZE]) -> String {
    URL_SAFE_NO_PAD.encode(secret)
}

pub fn generate_iv() -> Result<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv)?;
    Ok(iv)
}

pub fn generate_salt() -> Result<[u8; SALT_SIZE]> {
    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt)?;
    Ok(salt)
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| CodecError::Randomness)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_positional() {
        let mut secret = [0u8; SECRET_SIZE];
        for (i, b) in secret.iter_mut().enumerate() {
            *b = i as u8;
        }

        let keys = KeyMaterial::from_random_secret(&secret);
        assert_eq!(&keys.cipher_key()[..], &secret[..KEY_SIZE]);
        assert_eq!(&keys.integrity_key()[..], &secret[KEY_SIZE..]);
    }

    #[test]
    fn test_share_key_roundtrip() {
        let secret = generate_secret().unwrap();
        let encoded = encode_share_key(&secret);

        // URL-safe, no padding: safe to drop into a fragment as-is
        assert!(!encoded.contains(['+', '/', '=']));

        let keys = KeyMaterial::from_share_key(&encoded).unwrap();
        assert_eq!(&keys.cipher_key()[..], &secret[..KEY_SIZE]);
        assert_eq!(&keys.integrity_key()[..], &secret[KEY_SIZE..]);
    }

    #[test]
    fn test_malformed_share_key_rejected() {
        assert_eq!(
            KeyMaterial::from_share_key("not base64 at all!").err(),
            Some(CodecError::Integrity)
        );

        let short = URL_SAFE_NO_PAD.encode([7u8; 32]);
        assert_eq!(
            KeyMaterial::from_share_key(&short).err(),
            Some(CodecError::Integrity)
        );
    }

    #[test]
    fn test_password_derivation_is_deterministic() {
        let salt = [9u8; SALT_SIZE];
        let a = KeyMaterial::from_password("hunter2", &salt, 1_000).unwrap();
        let b = KeyMaterial::from_password("hunter2", &salt, 1_000).unwrap();
        let c = KeyMaterial::from_password("hunter3", &salt, 1_000).unwrap();

        assert_eq!(a.cipher_key(), b.cipher_key());
        assert_eq!(a.integrity_key(), b.integrity_key());
        assert_ne!(a.cipher_key(), c.cipher_key());
        // The two halves are independent-looking
        assert_ne!(a.cipher_key(), a.integrity_key());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(KeyMaterial::from_password("pw", &[0u8; SALT_SIZE], 0).is_err());
    }

    #[test]
    fn test_fresh_randomness() {
        assert_ne!(generate_iv().unwrap(), generate_iv().unwrap());
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
        assert_ne!(*generate_secret().unwrap(), *generate_secret().unwrap());
    }
}
