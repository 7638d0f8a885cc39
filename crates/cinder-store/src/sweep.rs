//! Background eviction
//!
//! Notes nobody opens would otherwise sit in memory until their id is read.
//! The sweeper evicts them on a fixed interval, taking the same lock as
//! `read`, so it can never race a reader on the same note.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::NoteStore;

/// Running sweeper task. Dropping the handle aborts the task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to finish its current pass.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start sweeping `store` every `interval`. Must be called inside a tokio
/// runtime.
pub fn spawn_sweeper(store: Arc<NoteStore>, interval: Duration) -> SweeperHandle {
    let (tx, mut rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep();
                    if removed > 0 {
                        tracing::info!(removed, remaining = store.len(), "swept dead notes");
                    }
                }
                _ = &mut rx => {
                    tracing::debug!("sweeper stopping");
                    break;
                }
            }
        }
    });

    tracing::debug!(interval_ms = interval.as_millis() as u64, "sweeper started");
    SweeperHandle {
        shutdown: Some(tx),
        task,
    }
}
