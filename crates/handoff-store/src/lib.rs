//! Staging store for the deposit/claim handoff.
//!
//! Holds short-lived payloads keyed by a caller-chosen correlation id.
//! Every entry expires after a fixed TTL and can be read at most once:
//! a successful `get` removes the entry in the same critical section.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use handoff_store::{MemoryStore, RequestContext, Store, StoreConfig};
//!
//! # async fn example() -> Result<(), handoff_store::StoreError> {
//! let (store, sweeper) = MemoryStore::spawn(StoreConfig::new());
//! let ctx = RequestContext::new();
//!
//! store.set(&ctx, "abc", b"payload".to_vec()).await?;
//! let payload = store.get(&ctx, "abc").await?;
//! assert_eq!(payload, b"payload");
//!
//! // Second read: the entry is gone.
//! assert!(store.get(&ctx, "abc").await.is_err());
//!
//! sweeper.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod closure;
mod context;
mod contract;
mod error;
pub mod memory;

pub use closure::{FnStore, Getter, Setter};
pub use context::RequestContext;
pub use contract::Store;
pub use error::{StoreError, StoreResult};
pub use memory::{
    MemoryStore, StagedEntry, StagingMap, StoreConfig, StoreEvent, SweeperHandle, TakeOutcome,
    DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, MIN_SWEEP_INTERVAL,
};
