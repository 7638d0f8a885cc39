//! Send and open flows
//!
//! Sender: seal → create → link. Recipient: read (spends a view) → inspect →
//! ask for a password only if the envelope needs one → open.
//!
//! PBKDF2 is deliberately slow, so sealing and opening run on tokio's
//! blocking pool instead of the executor threads.

use cinder_crypto::{codec, Credentials, EnvelopeInfo};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::backend::NoteBackend;
use crate::config::ClientConfig;
use crate::ids;
use crate::link::ShareLink;
use crate::wire::{CreateNoteRequest, CreateReceipt};
use crate::{NoteError, Result};

/// How a note should be sealed and stored
#[derive(Clone)]
pub struct SendOptions {
    pub password: Option<SecretString>,
    pub ttl_minutes: f64,
    pub burn_after_read: bool,
    pub max_views: Option<u32>,
}

impl SendOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            password: None,
            ttl_minutes: config.default_ttl_minutes,
            burn_after_read: config.default_burn_after_read,
            max_views: config.default_max_views,
        }
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Vault mode: `views` reads before the note is gone
    pub fn with_views(mut self, views: u32) -> Self {
        self.burn_after_read = false;
        self.max_views = Some(views);
        self
    }
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// A stored note and the link that opens it
pub struct SentNote {
    pub link: ShareLink,
    pub receipt: CreateReceipt,
    pub requires_password: bool,
}

/// A successfully opened note
pub struct OpenedNote {
    pub plaintext: Zeroizing<String>,
    pub info: EnvelopeInfo,
    pub remaining_views: u32,
    pub expires_at: i64,
}

pub struct NoteService<B> {
    backend: B,
    link_base: String,
}

impl<B: NoteBackend> NoteService<B> {
    pub fn new(backend: B, link_base: impl Into<String>) -> Self {
        Self {
            backend,
            link_base: link_base.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Seal `message` and store it. The link key (if any) only ever ends up
    /// in the returned link.
    pub async fn send(&self, message: &str, options: SendOptions) -> Result<SentNote> {
        let message = Zeroizing::new(message.to_owned());
        let password = options.password.clone();

        let sealed = tokio::task::spawn_blocking(move || {
            codec::encrypt(
                &message,
                password.as_ref().map(|p| p.expose_secret().as_str()),
            )
        })
        .await
        .map_err(|e| NoteError::Offload(e.to_string()))??;

        let request = CreateNoteRequest {
            id: ids::generate_id(),
            blob: sealed.payload,
            ttl_minutes: options.ttl_minutes,
            burn_after_read: options.burn_after_read,
            max_views: options.max_views,
        };
        let receipt = self.backend.create(&request).await?;

        tracing::info!(
            id = request.id.as_str(),
            requires_password = sealed.requires_password,
            expires_at = receipt.expires_at,
            "note sent"
        );

        Ok(SentNote {
            link: ShareLink::new(&self.link_base, &request.id, sealed.share_key),
            receipt,
            requires_password: sealed.requires_password,
        })
    }

    /// Fetch and open the note behind `link`.
    ///
    /// The read spends a view before anything is decrypted: a wrong password
    /// still costs the recipient that view. `password_prompt` is called only
    /// for password-mode envelopes.
    pub async fn open<F>(&self, link: &ShareLink, password_prompt: F) -> Result<OpenedNote>
    where
        F: FnOnce(&EnvelopeInfo) -> Option<SecretString>,
    {
        let view = self.backend.read(link.id()).await?;
        let info = codec::inspect(&view.blob);

        let password = if info.requires_password() {
            password_prompt(&info)
        } else {
            None
        };
        let key = link.key().cloned();
        let blob = view.blob;

        let plaintext = tokio::task::spawn_blocking(move || {
            let credentials = Credentials {
                key: key.as_ref().map(|k| k.expose_secret().as_str()),
                password: password.as_ref().map(|p| p.expose_secret().as_str()),
            };
            codec::decrypt(&blob, &credentials)
        })
        .await
        .map_err(|e| NoteError::Offload(e.to_string()))??;

        tracing::info!(id = link.id(), remaining_views = view.remaining_views, "note opened");

        Ok(OpenedNote {
            plaintext,
            info,
            remaining_views: view.remaining_views,
            expires_at: view.expires_at,
        })
    }

    /// Destroy a note before anyone reads it
    pub async fn revoke(&self, id: &str) -> Result<()> {
        self.backend.remove(id).await?;
        tracing::info!(id, "note revoked");
        Ok(())
    }
}
