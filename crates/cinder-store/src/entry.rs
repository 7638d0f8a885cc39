//! Note entries and the values handed back to callers

use serde::{Deserialize, Serialize};

/// A stored note. All bookkeeping is plaintext so the sweep can evict
/// without touching the blob.
#[derive(Debug, Clone)]
pub struct NoteEntry {
    pub id: String,
    /// Serialized envelope, opaque to the store
    pub blob: String,
    /// Epoch milliseconds
    pub expires_at: i64,
    pub burn_after_read: bool,
    pub remaining_views: u32,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl NoteEntry {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_views == 0
    }

    /// True if the sweep should evict this entry
    pub fn is_dead(&self, now: i64) -> bool {
        self.is_expired(now) || self.is_exhausted()
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceipt {
    pub expires_at: i64,
    /// `None` for burn-after-read notes
    pub remaining_views: Option<u32>,
}

/// Result of a successful read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub blob: String,
    pub expires_at: i64,
    /// Views left after this one
    pub remaining_views: u32,
}
