/// Background sweep task for the in-memory store.
///
/// One task per store. It wakes every sweep interval, takes the write
/// lock and drops expired entries. Stopped through [`SweeperHandle`].
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::staging::StagingMap;
use super::types::StoreEvent;

/// Owns the sweep task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Whether the sweep task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("sweeper: task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn the sweep loop on the current tokio runtime.
pub(super) fn spawn(entries: Arc<RwLock<StagingMap>>, interval: Duration) -> SweeperHandle {
    let token = CancellationToken::new();
    let task = tokio::spawn(sweep_loop(entries, interval, token.clone()));
    SweeperHandle {
        token,
        task: Some(task),
    }
}

async fn sweep_loop(
    entries: Arc<RwLock<StagingMap>>,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the immediate first tick
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("sweeper: stopped");
                break;
            }
            _ = ticker.tick() => {
                sweep_once(&entries).await;
            }
        }
    }
}

/// Run a single sweep pass. Returns the number of entries removed.
pub(super) async fn sweep_once(entries: &RwLock<StagingMap>) -> usize {
    let events = entries.write().await.sweep_expired(Instant::now());
    for event in &events {
        if let StoreEvent::Expired { key } = event {
            tracing::trace!(key = %key, "sweeper: entry expired unclaimed");
        }
    }
    if !events.is_empty() {
        tracing::debug!(removed = events.len(), "sweeper: pass complete");
    }
    events.len()
}
