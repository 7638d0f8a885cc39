//! Cinder Crypto - Envelope codec for burn-after-read notes
//!
//! This crate provides:
//! - Key material resolution (random link key or password-derived)
//! - AES-256-CBC encryption with an HMAC-SHA-256 tag over every envelope field
//! - A self-describing, versioned envelope format
//! - Read-only support for legacy passphrase blobs
//!
//! Nothing here touches storage or the network. The server only ever sees the
//! serialized envelope; keys and passwords stay with the caller.

pub mod cipher;
pub mod codec;
pub mod envelope;
pub mod keys;
pub mod legacy;
mod mac;

pub use codec::{decrypt, encrypt, inspect, Credentials, Sealed};
pub use envelope::{Envelope, EnvelopeInfo, LegacyBlob, Mode, Payload, ENVELOPE_VERSION};
pub use keys::KeyMaterial;

/// Errors from sealing or opening a note.
///
/// Display strings never name the field or check that failed, and never
/// carry key material.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("A password or link key is required to open this note")]
    MissingCredential,

    #[error("Note could not be verified - wrong credential or tampered data")]
    Integrity,

    #[error("Note could not be decrypted")]
    Decryption,

    #[error("Cannot seal an empty message")]
    EmptyMessage,

    #[error("System randomness unavailable")]
    Randomness,

    #[error("Envelope encoding failed")]
    Encoding,
}

pub type Result<T> = std::result::Result<T, CodecError>;
