use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::StoreResult;

/// Storage contract consumed by the handoff protocol.
///
/// In production: [`MemoryStore`](crate::MemoryStore), or any external
/// key/value service wrapped behind this trait.
/// In tests: [`FnStore`](crate::FnStore) with scripted closures.
///
/// `get` must be destructive: a value is returned at most once, and a
/// missing, expired or already-read key yields [`StoreError::NotFound`].
///
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace the value for `key`.
    async fn set(&self, ctx: &RequestContext, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove and return the live value for `key`.
    async fn get(&self, ctx: &RequestContext, key: &str) -> StoreResult<Vec<u8>>;

    /// The half of the contract this store cannot serve, if any.
    fn unconfigured(&self) -> Option<&'static str> {
        None
    }
}

#[async_trait::async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn set(&self, ctx: &RequestContext, key: &str, value: Vec<u8>) -> StoreResult<()> {
        (**self).set(ctx, key, value).await
    }

    async fn get(&self, ctx: &RequestContext, key: &str) -> StoreResult<Vec<u8>> {
        (**self).get(ctx, key).await
    }

    fn unconfigured(&self) -> Option<&'static str> {
        (**self).unconfigured()
    }
}
