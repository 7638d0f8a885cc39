//! Seal and open note envelopes
//!
//! Order of operations on open matters: the integrity tag is verified before
//! the cipher ever sees the ciphertext. A tampered envelope or a wrong
//! credential stops at `Integrity` and never reaches AES.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::envelope::{Envelope, EnvelopeInfo, Mode, Payload, ENVELOPE_VERSION};
use crate::keys::{
    self, KeyMaterial, DEFAULT_ITERATIONS, IV_SIZE, MAX_ITERATIONS, MIN_ITERATIONS, SALT_SIZE,
};
use crate::{cipher, legacy, mac, CodecError, Result};

/// Output of `encrypt()`.
pub struct Sealed {
    /// Serialized envelope, safe to hand to the store
    pub payload: String,
    /// Encoded link key (link mode only). Goes in the link, never the store.
    pub share_key: Option<SecretString>,
    pub requires_password: bool,
    pub integrity_tag: String,
}

/// Whatever the recipient has on hand.
#[derive(Default, Clone, Copy)]
pub struct Credentials<'a> {
    pub key: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn key(key: &'a str) -> Self {
        Self {
            key: Some(key),
            password: None,
        }
    }

    pub fn password(password: &'a str) -> Self {
        Self {
            key: None,
            password: Some(password),
        }
    }
}

/// Seal `message`, deriving keys from `password` if given, otherwise from a
/// fresh random secret returned as the share key.
pub fn encrypt(message: &str, password: Option<&str>) -> Result<Sealed> {
    seal_at(message, password, chrono::Utc::now().timestamp_millis())
}

fn seal_at(message: &str, password: Option<&str>, created_at: i64) -> Result<Sealed> {
    if message.is_empty() {
        return Err(CodecError::EmptyMessage);
    }

    let iv = keys::generate_iv()?;

    let (mode, key_material, salt, share_key) = match password {
        Some(password) => {
            let salt = keys::generate_salt()?;
            let material = KeyMaterial::from_password(password, &salt, DEFAULT_ITERATIONS)?;
            (Mode::Password, material, Some(STANDARD.encode(salt)), None)
        }
        None => {
            let secret = keys::generate_secret()?;
            let material = KeyMaterial::from_random_secret(&secret);
            let share_key = SecretString::new(keys::encode_share_key(&secret));
            (Mode::Link, material, None, Some(share_key))
        }
    };

    let ciphertext = cipher::encrypt(key_material.cipher_key(), &iv, message.as_bytes())?;

    let mut envelope = Envelope {
        version: ENVELOPE_VERSION.to_string(),
        mode,
        ciphertext: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(iv),
        salt,
        integrity_tag: String::new(),
        iterations: DEFAULT_ITERATIONS,
        created_at,
    };
    envelope.integrity_tag = mac::compute_tag(
        key_material.integrity_key(),
        envelope.tag_message().as_bytes(),
    );

    tracing::debug!(mode = mode.as_str(), "sealed note envelope");

    Ok(Sealed {
        payload: envelope.to_json()?,
        share_key,
        requires_password: mode == Mode::Password,
        integrity_tag: envelope.integrity_tag,
    })
}

/// Open a payload with the given credentials.
pub fn decrypt(payload: &str, credentials: &Credentials<'_>) -> Result<Zeroizing<String>> {
    match Payload::parse(payload) {
        Payload::Versioned(envelope) => open_envelope(&envelope, credentials),
        Payload::Legacy(blob) => {
            let key = credentials.key.ok_or(CodecError::MissingCredential)?;
            tracing::debug!("opening legacy note blob");
            legacy::decrypt(&blob, key)
        }
    }
}

/// Metadata only. Tells the caller whether to prompt for a password before
/// asking the user for anything.
pub fn inspect(payload: &str) -> EnvelopeInfo {
    EnvelopeInfo::from(&Payload::parse(payload))
}

fn open_envelope(envelope: &Envelope, credentials: &Credentials<'_>) -> Result<Zeroizing<String>> {
    let key_material = resolve_keys(envelope, credentials)?;

    if !mac::verify_tag(
        key_material.integrity_key(),
        envelope.tag_message().as_bytes(),
        &envelope.integrity_tag,
    ) {
        return Err(CodecError::Integrity);
    }

    let iv: [u8; IV_SIZE] = decode_fixed(&envelope.iv)?;
    let ciphertext = STANDARD
        .decode(&envelope.ciphertext)
        .map_err(|_| CodecError::Integrity)?;

    let plaintext = cipher::decrypt(key_material.cipher_key(), &iv, &ciphertext)?;
    legacy::into_text(plaintext)
}

fn resolve_keys(envelope: &Envelope, credentials: &Credentials<'_>) -> Result<KeyMaterial> {
    match envelope.mode {
        Mode::Password => {
            let password = credentials.password.ok_or(CodecError::MissingCredential)?;
            let salt = envelope.salt.as_deref().ok_or(CodecError::Integrity)?;
            let salt: [u8; SALT_SIZE] = decode_fixed(salt)?;
            if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&envelope.iterations) {
                return Err(CodecError::Integrity);
            }
            KeyMaterial::from_password(password, &salt, envelope.iterations)
        }
        Mode::Link => {
            let key = credentials.key.ok_or(CodecError::MissingCredential)?;
            if envelope.salt.is_some() {
                return Err(CodecError::Integrity);
            }
            KeyMaterial::from_share_key(key)
        }
    }
}

fn decode_fixed<const N: usize>(encoded: &str) -> Result<[u8; N]> {
    STANDARD
        .decode(encoded)
        .map_err(|_| CodecError::Integrity)?
        .try_into()
        .map_err(|_| CodecError::Integrity)
}
