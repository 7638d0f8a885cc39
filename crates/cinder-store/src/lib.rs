//! Cinder Store - Ephemeral note storage
//!
//! Holds opaque envelope blobs with a disclosure budget and an expiry.
//! Every successful read spends one disclosure; when the budget hits zero or
//! the clock passes `expires_at`, the note is gone for good.
//!
//! The store never sees keys or passwords, only the sealed blob.

mod clock;
mod config;
mod entry;
mod store;
mod sweep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, DEFAULT_VIEWS, MAX_VIEWS, MIN_VIEWS};
pub use entry::{CreateReceipt, NoteEntry, NoteView};
pub use store::NoteStore;
pub use sweep::{spawn_sweeper, SweeperHandle};

/// Errors from store operations
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Note not found")]
    NotFound,

    #[error("Note has expired")]
    Gone,
}

impl StoreError {
    /// HTTP-style status class for transports that need one
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 400,
            StoreError::NotFound => 404,
            StoreError::Gone => 410,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
