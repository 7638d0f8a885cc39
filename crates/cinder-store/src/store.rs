//! In-memory note store
//!
//! One mutex guards the whole map. Every mutation (create, the
//! check-and-decrement of a read, delete, sweep) runs start to finish under
//! that lock, so two readers can never both spend the same view.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::{Clock, SystemClock};
use crate::config::{StoreConfig, MAX_VIEWS, MIN_VIEWS};
use crate::entry::{CreateReceipt, NoteEntry, NoteView};
use crate::{Result, StoreError};

const MIN_ID_LEN: usize = 6;
const MAX_ID_LEN: usize = 36;

/// Ephemeral id → blob map with disclosure and expiry bookkeeping
pub struct NoteStore {
    entries: Mutex<HashMap<String, NoteEntry>>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl NoteStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Store a blob under `id`.
    ///
    /// Burn-after-read notes get exactly one view. Vault notes get
    /// `max_views` (or the configured default) clamped to `[2, 50]`.
    pub fn create(
        &self,
        id: &str,
        blob: &str,
        ttl_minutes: f64,
        burn_after_read: bool,
        max_views: Option<u32>,
    ) -> Result<CreateReceipt> {
        self.validate(id, blob, ttl_minutes)?;

        let ttl_minutes = ttl_minutes.min(self.config.max_ttl_minutes);
        let now = self.clock.now_millis();
        // Round up so a sub-millisecond ttl still leaves the note readable now
        let expires_at = now.saturating_add((ttl_minutes * 60_000.0).ceil() as i64);

        let remaining_views = if burn_after_read {
            1
        } else {
            max_views
                .unwrap_or(self.config.default_views)
                .clamp(MIN_VIEWS, MAX_VIEWS)
        };

        let mut entries = self.entries();
        if let Some(existing) = entries.get(id) {
            if !existing.is_dead(now) {
                tracing::warn!(id, "rejected create for an id already in use");
                return Err(StoreError::Validation("id already in use".to_string()));
            }
        }

        entries.insert(
            id.to_string(),
            NoteEntry {
                id: id.to_string(),
                blob: blob.to_string(),
                expires_at,
                burn_after_read,
                remaining_views,
                created_at: now,
            },
        );
        tracing::debug!(id, burn_after_read, remaining_views, expires_at, "note created");

        Ok(CreateReceipt {
            expires_at,
            remaining_views: (!burn_after_read).then_some(remaining_views),
        })
    }

    /// Spend one view of `id` and hand back the blob.
    pub fn read(&self, id: &str) -> Result<NoteView> {
        let now = self.clock.now_millis();
        let mut entries = self.entries();

        let entry = entries.get_mut(id).ok_or(StoreError::NotFound)?;

        if entry.is_expired(now) {
            entries.remove(id);
            tracing::debug!(id, "note expired on access");
            return Err(StoreError::Gone);
        }

        if entry.is_exhausted() {
            entries.remove(id);
            return Err(StoreError::NotFound);
        }

        if entry.burn_after_read {
            let entry = entries.remove(id).ok_or(StoreError::NotFound)?;
            tracing::debug!(id, "note burned");
            return Ok(NoteView {
                blob: entry.blob,
                expires_at: entry.expires_at,
                remaining_views: 0,
            });
        }

        entry.remaining_views -= 1;
        let remaining_views = entry.remaining_views;
        let expires_at = entry.expires_at;

        let blob = if remaining_views == 0 {
            let entry = entries.remove(id).ok_or(StoreError::NotFound)?;
            tracing::debug!(id, "note exhausted");
            entry.blob
        } else {
            tracing::debug!(id, remaining_views, "note viewed");
            entry.blob.clone()
        };

        Ok(NoteView {
            blob,
            expires_at,
            remaining_views,
        })
    }

    /// Remove `id` if present. Succeeds either way.
    pub fn delete(&self, id: &str) {
        if self.entries().remove(id).is_some() {
            tracing::debug!(id, "note deleted");
        }
    }

    /// Evict every expired or exhausted entry. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_dead(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, id: &str, blob: &str, ttl_minutes: f64) -> Result<()> {
        let id_len = id.chars().count();
        if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&id_len) {
            return Err(StoreError::Validation(format!(
                "id must be {MIN_ID_LEN}-{MAX_ID_LEN} characters"
            )));
        }
        if blob.is_empty() {
            return Err(StoreError::Validation("blob is empty".to_string()));
        }
        if blob.len() > self.config.max_blob_bytes {
            return Err(StoreError::Validation(format!(
                "blob exceeds {} bytes",
                self.config.max_blob_bytes
            )));
        }
        if !ttl_minutes.is_finite() || ttl_minutes <= 0.0 {
            return Err(StoreError::Validation(
                "ttl must be a positive number of minutes".to_string(),
            ));
        }
        Ok(())
    }

    // Every critical section leaves the map consistent, so a panic elsewhere
    // while holding the lock does not invalidate it.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, NoteEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
