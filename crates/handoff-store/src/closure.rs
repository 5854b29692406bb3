//! Store assembled from a setter and a getter closure.
//!
//! Lets an application plug an external cache (Redis, a database, another
//! service) without writing a full [`Store`] impl.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::context::RequestContext;
use crate::contract::Store;
use crate::error::{StoreError, StoreResult};

/// Write half of an [`FnStore`].
pub type Setter =
    Arc<dyn Fn(RequestContext, String, Vec<u8>) -> BoxFuture<'static, StoreResult<()>> + Send + Sync>;

/// Read half of an [`FnStore`]. Must remove the value it returns.
pub type Getter =
    Arc<dyn Fn(RequestContext, String) -> BoxFuture<'static, StoreResult<Vec<u8>>> + Send + Sync>;

/// A [`Store`] backed by two closures.
///
/// Either half may be missing; calling it then fails with
/// [`StoreError::Unconfigured`].
///
/// ```rust
/// use handoff_store::{FnStore, StoreError};
///
/// let store = FnStore::new()
///     .with_setter(|_ctx, _key, _value| async { Ok::<(), StoreError>(()) })
///     .with_getter(|_ctx, key| async move { Err::<Vec<u8>, _>(StoreError::not_found(key)) });
/// assert!(store.is_complete());
/// ```
#[derive(Clone, Default)]
pub struct FnStore {
    setter: Option<Setter>,
    getter: Option<Getter>,
}

impl FnStore {
    /// Empty store: both halves unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the write half.
    pub fn with_setter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, String, Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<()>> + Send + 'static,
    {
        let setter: Setter = Arc::new(move |ctx: RequestContext, key: String, value: Vec<u8>| {
            f(ctx, key, value).boxed()
        });
        self.setter = Some(setter);
        self
    }

    /// Install the read half.
    pub fn with_getter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Vec<u8>>> + Send + 'static,
    {
        let getter: Getter =
            Arc::new(move |ctx: RequestContext, key: String| f(ctx, key).boxed());
        self.getter = Some(getter);
        self
    }

    /// Whether both halves are installed.
    pub fn is_complete(&self) -> bool {
        self.setter.is_some() && self.getter.is_some()
    }
}

impl fmt::Debug for FnStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStore")
            .field("setter", &self.setter.is_some())
            .field("getter", &self.getter.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl Store for FnStore {
    async fn set(&self, ctx: &RequestContext, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let Some(setter) = &self.setter else {
            return Err(StoreError::Unconfigured { missing: "setter" });
        };
        setter(ctx.clone(), key.to_string(), value).await
    }

    async fn get(&self, ctx: &RequestContext, key: &str) -> StoreResult<Vec<u8>> {
        let Some(getter) = &self.getter else {
            return Err(StoreError::Unconfigured { missing: "getter" });
        };
        getter(ctx.clone(), key.to_string()).await
    }

    fn unconfigured(&self) -> Option<&'static str> {
        match (&self.setter, &self.getter) {
            (None, _) => Some("setter"),
            (_, None) => Some("getter"),
            _ => None,
        }
    }
}
