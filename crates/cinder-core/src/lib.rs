//! Cinder Core - Sending and opening notes
//!
//! This crate ties the envelope codec to a store backend. Frontends (CLI,
//! HTTP server, future web client) go through `NoteService`; which backend
//! is live (in-process store or remote server) is invisible to them.

pub mod backend;
pub mod config;
pub mod ids;
pub mod link;
pub mod remote;
pub mod service;
pub mod wire;

pub use backend::{Backend, LocalBackend, NoteBackend};
pub use config::ClientConfig;
pub use link::ShareLink;
pub use remote::HttpBackend;
pub use service::{NoteService, OpenedNote, SendOptions, SentNote};

use cinder_crypto::CodecError;
use cinder_store::StoreError;

/// Everything that can go wrong sending or opening a note
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid share link: {0}")]
    InvalidLink(String),

    #[error("Background task failed: {0}")]
    Offload(String),
}

pub type Result<T> = std::result::Result<T, NoteError>;
