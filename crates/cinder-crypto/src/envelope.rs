//! Versioned note envelope
//!
//! A flat JSON record carrying everything needed to open a note except the
//! credential. Anything that is not a current-version record with a known
//! mode is a `LegacyBlob`: it is never rejected outright, only routed to the
//! legacy decrypt path.

use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

/// Envelope format written by this build
pub const ENVELOPE_VERSION: &str = "2";
/// Version reported for anything that is not a current envelope
pub const LEGACY_VERSION: &str = "legacy";

/// How the recipient obtains the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Random secret carried in the share link
    Link,
    /// Secret derived from a password the recipient types in
    Password,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Link => "link",
            Mode::Password => "password",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "link" => Some(Mode::Link),
            "password" => Some(Mode::Password),
            _ => None,
        }
    }
}

/// The serialized note. Binary fields are standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: String,
    pub mode: Mode,
    pub ciphertext: String,
    pub iv: String,
    /// Present iff `mode == Password`
    pub salt: Option<String>,
    pub integrity_tag: String,
    /// PBKDF2 rounds; meaningless in link mode
    pub iterations: u32,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Envelope {
    /// Canonical message covered by the integrity tag.
    ///
    /// Every field except the tag itself is bound, so swapping metadata
    /// between envelopes breaks verification.
    pub fn tag_message(&self) -> String {
        let created_at = self.created_at.to_string();
        [
            self.mode.as_str(),
            self.ciphertext.as_str(),
            self.iv.as_str(),
            self.salt.as_deref().unwrap_or(""),
            created_at.as_str(),
            self.version.as_str(),
        ]
        .join("|")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|_| CodecError::Encoding)
    }
}

/// Opaque pre-envelope ciphertext, decryptable only with an external key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBlob {
    raw: String,
}

impl LegacyBlob {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A payload resolved once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Versioned(Envelope),
    Legacy(LegacyBlob),
}

impl Payload {
    /// Classify a stored payload. Never fails.
    pub fn parse(payload: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) else {
            return Payload::Legacy(LegacyBlob::new(payload.trim()));
        };

        let version = value.get("version").and_then(|v| v.as_str());
        let mode = value.get("mode").and_then(|m| m.as_str()).and_then(Mode::parse);

        if version == Some(ENVELOPE_VERSION) && mode.is_some() {
            if let Ok(envelope) = serde_json::from_value::<Envelope>(value.clone()) {
                return Payload::Versioned(envelope);
            }
        }

        // Older records wrapped the raw ciphertext in a `ciphertext` field
        let raw = value
            .get("ciphertext")
            .and_then(|c| c.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| payload.trim().to_owned());
        Payload::Legacy(LegacyBlob::new(raw))
    }
}

/// Metadata visible without any credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeInfo {
    pub mode: Mode,
    pub version: String,
    pub created_at: i64,
}

impl EnvelopeInfo {
    pub fn legacy() -> Self {
        Self {
            mode: Mode::Link,
            version: LEGACY_VERSION.to_string(),
            created_at: 0,
        }
    }

    pub fn requires_password(&self) -> bool {
        self.mode == Mode::Password
    }
}

impl From<&Payload> for EnvelopeInfo {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Versioned(envelope) => Self {
                mode: envelope.mode,
                version: envelope.version.clone(),
                created_at: envelope.created_at,
            },
            Payload::Legacy(_) => Self::legacy(),
        }
    }
}
