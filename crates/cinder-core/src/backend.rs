//! Store backends
//!
//! The codec and the service do not care where blobs live. A backend only
//! needs the three store operations, with the store's eviction semantics.

use std::sync::Arc;

use cinder_store::NoteStore;

use crate::config::ClientConfig;
use crate::remote::HttpBackend;
use crate::wire::{CreateNoteRequest, CreateReceipt, NoteView};
use crate::Result;

/// The store contract, transport-agnostic
#[allow(async_fn_in_trait)]
pub trait NoteBackend {
    async fn create(&self, request: &CreateNoteRequest) -> Result<CreateReceipt>;

    /// Spends one view
    async fn read(&self, id: &str) -> Result<NoteView>;

    /// Idempotent
    async fn remove(&self, id: &str) -> Result<()>;
}

/// In-process store
#[derive(Clone)]
pub struct LocalBackend {
    store: Arc<NoteStore>,
}

impl LocalBackend {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<NoteStore> {
        &self.store
    }
}

impl NoteBackend for LocalBackend {
    async fn create(&self, request: &CreateNoteRequest) -> Result<CreateReceipt> {
        Ok(self.store.create(
            &request.id,
            &request.blob,
            request.ttl_minutes,
            request.burn_after_read,
            request.max_views,
        )?)
    }

    async fn read(&self, id: &str) -> Result<NoteView> {
        Ok(self.store.read(id)?)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(id);
        Ok(())
    }
}

/// Backend picked at runtime from configuration
pub enum Backend {
    Local(LocalBackend),
    Remote(HttpBackend),
}

impl Backend {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        match &config.server_url {
            Some(url) => {
                tracing::debug!(url = url.as_str(), "using remote note store");
                Ok(Backend::Remote(HttpBackend::new(url, config.request_timeout())?))
            }
            None => {
                tracing::debug!("using in-process note store");
                Ok(Backend::Local(LocalBackend::new(Arc::new(NoteStore::default()))))
            }
        }
    }
}

impl NoteBackend for Backend {
    async fn create(&self, request: &CreateNoteRequest) -> Result<CreateReceipt> {
        match self {
            Backend::Local(b) => b.create(request).await,
            Backend::Remote(b) => b.create(request).await,
        }
    }

    async fn read(&self, id: &str) -> Result<NoteView> {
        match self {
            Backend::Local(b) => b.read(id).await,
            Backend::Remote(b) => b.read(id).await,
        }
    }

    async fn remove(&self, id: &str) -> Result<()> {
        match self {
            Backend::Local(b) => b.remove(id).await,
            Backend::Remote(b) => b.remove(id).await,
        }
    }
}
