/// In-memory staging store.
///
/// Three layers:
/// - **Types**: entries, configuration, events, constants
/// - **Staging**: the pure map (stage, take, sweep)
/// - **Sweeper**: the background task that evicts expired entries
mod staging;
mod sweeper;
mod types;

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::context::RequestContext;
use crate::contract::Store;
use crate::error::{StoreError, StoreResult};

pub use staging::StagingMap;
pub use sweeper::SweeperHandle;
pub use types::{
    StagedEntry, StoreConfig, StoreEvent, TakeOutcome, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL,
    MIN_SWEEP_INTERVAL,
};

/// Expiring, read-once key/value store held in process memory.
///
/// A single `RwLock` guards the whole map. Existence checks share the read
/// lock; writes, destructive reads and sweeps take the write lock, so two
/// racing `get` calls for one key have exactly one winner.
///
/// Cheap to clone. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<StagingMap>>,
    config: StoreConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MemoryStore {
    /// Create a store without a background sweeper.
    ///
    /// Expired entries stay invisible to `get` but keep their memory until
    /// [`sweep_expired`](Self::sweep_expired) runs. Use [`spawn`](Self::spawn)
    /// for the usual setup.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(StagingMap::new())),
            config,
        }
    }

    /// Create a store and start its sweeper on the current tokio runtime.
    pub fn spawn(config: StoreConfig) -> (Self, SweeperHandle) {
        let store = Self::new(config);
        let sweeper = store.spawn_sweeper();
        (store, sweeper)
    }

    /// Start a sweeper for this store. The store runs one per handle.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        sweeper::spawn(self.entries.clone(), self.config.sweep_interval)
    }

    /// Run one sweep pass now. Returns the number of entries removed.
    pub async fn sweep_expired(&self) -> usize {
        sweeper::sweep_once(&self.entries).await
    }

    /// Whether a live entry exists for `key`. Non-destructive.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains(key, Instant::now())
    }

    /// Number of held entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn set(&self, ctx: &RequestContext, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let event = self.entries.write().await.stage(
            key.to_string(),
            value,
            Instant::now(),
            self.config.ttl,
        );
        if let StoreEvent::Staged { replaced, .. } = event {
            tracing::debug!(
                request_id = %ctx.request_id(),
                key,
                replaced,
                "store: entry staged"
            );
        }
        Ok(())
    }

    async fn get(&self, ctx: &RequestContext, key: &str) -> StoreResult<Vec<u8>> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let outcome = self.entries.write().await.take(key, Instant::now());
        match outcome {
            TakeOutcome::Claimed(payload) => {
                tracing::debug!(request_id = %ctx.request_id(), key, "store: entry claimed");
                Ok(payload)
            }
            TakeOutcome::Expired => {
                tracing::trace!(request_id = %ctx.request_id(), key, "store: entry expired before claim");
                Err(StoreError::not_found(key))
            }
            TakeOutcome::Absent => Err(StoreError::not_found(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(StoreConfig::new())
    }

    #[tokio::test]
    async fn set_then_get_once() {
        let store = store();
        let ctx = RequestContext::new();

        store.set(&ctx, "abc", b"hello".to_vec()).await.unwrap();
        assert!(store.contains("abc").await);

        assert_eq!(store.get(&ctx, "abc").await.unwrap(), b"hello");
        assert_eq!(
            store.get(&ctx, "abc").await.unwrap_err(),
            StoreError::not_found("abc")
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn get_unknown_key_is_not_found() {
        let store = store();
        let err = store.get(&RequestContext::new(), "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn cancelled_set_stores_nothing() {
        let store = store();
        let ctx = RequestContext::new();
        ctx.cancel();

        let err = store.set(&ctx, "abc", vec![1]).await.unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn cancelled_get_leaves_entry() {
        let store = store();
        store.set(&RequestContext::new(), "abc", vec![1]).await.unwrap();

        let ctx = RequestContext::new();
        ctx.cancel();
        assert_eq!(store.get(&ctx, "abc").await.unwrap_err(), StoreError::Cancelled);

        // Entry still claimable by a live request
        assert_eq!(store.get(&RequestContext::new(), "abc").await.unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_not_found() {
        let store = MemoryStore::new(StoreConfig::new().ttl(Duration::from_secs(60)));
        let ctx = RequestContext::new();
        store.set(&ctx, "abc", vec![1]).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!store.contains("abc").await);
        assert!(store.get(&ctx, "abc").await.unwrap_err().is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_sweep_removes_expired() {
        let store = MemoryStore::new(StoreConfig::new().ttl(Duration::from_secs(10)));
        let ctx = RequestContext::new();
        store.set(&ctx, "a", vec![1]).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        store.set(&ctx, "b", vec![2]).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.sweep_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.contains("b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_with_nothing_expired_changes_nothing() {
        let store = store();
        let ctx = RequestContext::new();
        store.set(&ctx, "a", vec![1]).await.unwrap();
        store.set(&ctx, "b", vec![2]).await.unwrap();

        assert_eq!(store.sweep_expired().await, 0);
        assert_eq!(store.sweep_expired().await, 0);
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(&ctx, "a").await.unwrap(), vec![1]);
        assert_eq!(store.get(&ctx, "b").await.unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_evicts_unclaimed() {
        let config = StoreConfig::new()
            .ttl(Duration::from_secs(60))
            .sweep_interval(Duration::from_secs(5));
        let (store, sweeper) = MemoryStore::spawn(config);
        store.set(&RequestContext::new(), "abc", vec![1]).await.unwrap();

        // Expired at 60s, swept by the 65s tick at the latest
        tokio::time::sleep(Duration::from_secs(66)).await;
        assert_eq!(store.len().await, 0);

        assert!(sweeper.is_running());
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sweeper_stops() {
        let (store, sweeper) = MemoryStore::spawn(StoreConfig::new().ttl(Duration::from_secs(1)));
        drop(sweeper);

        store.set(&RequestContext::new(), "abc", vec![1]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        // Nobody swept: the entry is still held, but no longer claimable.
        assert_eq!(store.len().await, 1);
        assert!(!store.contains("abc").await);
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let store = store();
        store.set(&RequestContext::new(), "race", vec![9]).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.get(&RequestContext::new(), "race").await
            }));
        }

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(payload) => {
                    assert_eq!(payload, vec![9]);
                    winners += 1;
                }
                Err(e) => assert!(e.is_not_found()),
            }
        }
        assert_eq!(winners, 1);
    }
}
