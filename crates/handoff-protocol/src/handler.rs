/// The deposit/claim handler.
///
/// Per request: pick the phase from the claim flag header, then
///
/// - **Deposit**: read the body, check `metadata.appSecret`, strip it,
///   stage the rest under the correlation id.
/// - **Claim**: take the staged payload for the correlation id. The store
///   removes it, so a second claim fails.
///
/// Every failure goes through the error hook before it is returned.
use std::fmt;
use std::sync::Arc;

use handoff_store::{MemoryStore, RequestContext, Store, StoreConfig, SweeperHandle};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::HandoffConfig;
use crate::envelope::Envelope;
use crate::error::{HandoffError, StoreOp};
use crate::headers::Headers;
use crate::hook::ErrorHook;
use crate::secret::AppSecret;

// ── Phase / Outcome ──────────────────────────────────────────────────

/// Which half of the handoff a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Webhook side: stage a payload.
    Deposit,
    /// User side: consume the staged payload.
    Claim,
}

impl Phase {
    /// Read the phase from the claim flag header.
    ///
    /// `true`, `1` and `yes` (any case) mean claim. Anything else,
    /// including a missing header, means deposit.
    pub fn from_headers(headers: &Headers, claim_header: &str) -> Self {
        match headers.first(claim_header) {
            Some(flag) if is_truthy(flag) => Phase::Claim,
            _ => Phase::Deposit,
        }
    }
}

fn is_truthy(flag: &str) -> bool {
    ["true", "1", "yes"]
        .iter()
        .any(|accepted| flag.eq_ignore_ascii_case(accepted))
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payload staged. Deposits have no response payload.
    Deposited,
    /// Payload claimed: the staged envelope, secret already stripped.
    Claimed(Vec<u8>),
}

impl Outcome {
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Outcome::Deposited => None,
            Outcome::Claimed(payload) => Some(payload),
        }
    }

    pub fn into_payload(self) -> Option<Vec<u8>> {
        match self {
            Outcome::Deposited => None,
            Outcome::Claimed(payload) => Some(payload),
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Assembles a [`Handoff`]. Store and hook are optional here; a handler
/// without a store rejects every request with `NotConfigured`.
pub struct HandoffBuilder {
    config: HandoffConfig,
    store: Option<Arc<dyn Store>>,
    hook: Option<Arc<dyn ErrorHook>>,
}

impl HandoffBuilder {
    /// Use `store` for staging.
    pub fn store(self, store: impl Store + 'static) -> Self {
        self.shared_store(Arc::new(store))
    }

    /// Use an already shared store.
    pub fn shared_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report failures to `hook`.
    pub fn error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Report failures to a closure.
    pub fn on_error<F>(self, f: F) -> Self
    where
        F: Fn(&RequestContext, &HandoffError) + Send + Sync + 'static,
    {
        self.error_hook(f)
    }

    pub fn build(self) -> Handoff {
        Handoff {
            config: self.config,
            store: self.store,
            hook: self.hook,
        }
    }
}

// ── Handoff ──────────────────────────────────────────────────────────

/// The handoff handler. Build once at startup, share behind an `Arc`.
pub struct Handoff {
    config: HandoffConfig,
    store: Option<Arc<dyn Store>>,
    hook: Option<Arc<dyn ErrorHook>>,
}

impl fmt::Debug for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handoff")
            .field("config", &self.config)
            .field("store", &self.store.is_some())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Handoff {
    /// Start building a handler.
    pub fn builder(config: HandoffConfig) -> HandoffBuilder {
        HandoffBuilder {
            config,
            store: None,
            hook: None,
        }
    }

    /// Handler backed by a fresh in-memory store, with its sweeper running.
    ///
    /// Keep the returned handle alive for as long as the handler serves
    /// requests; dropping it stops the sweeper.
    pub fn with_memory_store(
        config: HandoffConfig,
        store_config: StoreConfig,
    ) -> (Self, SweeperHandle) {
        let (store, sweeper) = MemoryStore::spawn(store_config);
        let handoff = Self::builder(config).store(store).build();
        (handoff, sweeper)
    }

    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Handle one inbound request.
    ///
    /// The claim flag header picks the phase. The body is only read on
    /// deposit.
    pub async fn handle<R>(
        &self,
        ctx: &RequestContext,
        headers: &Headers,
        body: R,
    ) -> Result<Outcome, HandoffError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let id = headers.first(&self.config.id_header).unwrap_or_default();
        let result = match Phase::from_headers(headers, &self.config.claim_header) {
            Phase::Deposit => self
                .try_deposit_from(ctx, id, body)
                .await
                .map(|()| Outcome::Deposited),
            Phase::Claim => self.try_claim(ctx, id).await.map(Outcome::Claimed),
        };
        result.map_err(|e| self.report(ctx, e))
    }

    /// Deposit an already-read body under `id`.
    pub async fn deposit(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: &[u8],
    ) -> Result<(), HandoffError> {
        let result = match self.ready() {
            Ok((secret, store)) => self.stage(ctx, secret, store, id, body).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(ctx, e))
    }

    /// Claim the payload staged under `id`.
    pub async fn claim(&self, ctx: &RequestContext, id: &str) -> Result<Vec<u8>, HandoffError> {
        self.try_claim(ctx, id)
            .await
            .map_err(|e| self.report(ctx, e))
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Both preconditions: a secret and a store.
    fn ready(&self) -> Result<(&AppSecret, &Arc<dyn Store>), HandoffError> {
        let secret = self
            .config
            .app_secret
            .as_ref()
            .ok_or(HandoffError::NotConfigured { what: "app secret" })?;
        let store = self
            .store
            .as_ref()
            .ok_or(HandoffError::NotConfigured { what: "store" })?;
        if let Some(missing) = store.unconfigured() {
            tracing::debug!(missing, "handoff: store is missing a half");
            return Err(HandoffError::NotConfigured { what: "store" });
        }
        Ok((secret, store))
    }

    async fn try_deposit_from<R>(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: R,
    ) -> Result<(), HandoffError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let (secret, store) = self.ready()?;
        let bytes = read_body(body, self.config.max_body_size).await?;
        self.stage(ctx, secret, store, id, &bytes).await
    }

    async fn stage(
        &self,
        ctx: &RequestContext,
        secret: &AppSecret,
        store: &Arc<dyn Store>,
        id: &str,
        body: &[u8],
    ) -> Result<(), HandoffError> {
        if body.is_empty() {
            return Err(HandoffError::bad_request("empty body"));
        }

        let mut envelope = Envelope::from_slice(body)?;
        let presented = envelope.strip_secret();
        if !presented.is_some_and(|p| secret.matches(&p)) {
            return Err(HandoffError::Unauthorized);
        }

        let id = require_id(id)?;
        let payload = envelope.to_vec()?;
        store
            .set(ctx, id, payload)
            .await
            .map_err(|e| HandoffError::from_store(StoreOp::Set, id, e))?;

        tracing::debug!(request_id = %ctx.request_id(), key = id, "handoff: deposit staged");
        Ok(())
    }

    async fn try_claim(&self, ctx: &RequestContext, id: &str) -> Result<Vec<u8>, HandoffError> {
        let (_, store) = self.ready()?;
        let id = require_id(id)?;

        let payload = store
            .get(ctx, id)
            .await
            .map_err(|e| HandoffError::from_store(StoreOp::Get, id, e))?;

        tracing::debug!(request_id = %ctx.request_id(), key = id, "handoff: payload claimed");
        Ok(payload)
    }

    fn report(&self, ctx: &RequestContext, err: HandoffError) -> HandoffError {
        if let Some(hook) = &self.hook {
            hook.notify(ctx, &err);
        }
        err
    }
}

fn require_id(id: &str) -> Result<&str, HandoffError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(HandoffError::bad_request("missing correlation id"));
    }
    Ok(id)
}

/// Read the whole body, refusing anything over `limit` bytes.
async fn read_body<R>(body: R, limit: usize) -> Result<Vec<u8>, HandoffError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    body.take((limit as u64).saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| HandoffError::bad_request(format!("unreadable body: {e}")))?;

    if bytes.len() > limit {
        return Err(HandoffError::bad_request(format!(
            "body exceeds {limit} bytes"
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use handoff_store::{FnStore, StoreError};

    use super::*;

    const BODY: &[u8] = br#"{"metadata":{"appSecret":"s3cret"},"data":{"x":1}}"#;

    fn handoff() -> Handoff {
        Handoff::builder(HandoffConfig::new().app_secret("s3cret"))
            .store(MemoryStore::default())
            .build()
    }

    fn deposit_headers(id: &str) -> Headers {
        [("x-0account-uuid", id)].into_iter().collect()
    }

    fn claim_headers(id: &str) -> Headers {
        [("x-0account-uuid", id), ("x-0account-auth", "true")]
            .into_iter()
            .collect()
    }

    #[test]
    fn phase_from_flag() {
        let claim = "x-0account-auth";
        for flag in ["true", "TRUE", "1", "yes", " true "] {
            let headers: Headers = [(claim, flag)].into_iter().collect();
            assert_eq!(Phase::from_headers(&headers, claim), Phase::Claim, "{flag}");
        }
        for flag in ["false", "0", "", "truthy"] {
            let headers: Headers = [(claim, flag)].into_iter().collect();
            assert_eq!(Phase::from_headers(&headers, claim), Phase::Deposit, "{flag}");
        }
        assert_eq!(Phase::from_headers(&Headers::new(), claim), Phase::Deposit);
    }

    #[tokio::test]
    async fn deposit_then_claim_once() {
        let handoff = handoff();
        let ctx = RequestContext::new();

        let outcome = handoff.handle(&ctx, &deposit_headers("abc"), BODY).await.unwrap();
        assert_eq!(outcome, Outcome::Deposited);
        assert_eq!(outcome.payload(), None);

        let outcome = handoff
            .handle(&ctx, &claim_headers("abc"), tokio::io::empty())
            .await
            .unwrap();
        assert_eq!(
            outcome.into_payload().unwrap(),
            br#"{"metadata":{},"data":{"x":1}}"#
        );

        let err = handoff
            .handle(&ctx, &claim_headers("abc"), tokio::io::empty())
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::Unauthorized);
    }

    #[tokio::test]
    async fn missing_secret_is_not_configured() {
        let handoff = Handoff::builder(HandoffConfig::new())
            .store(MemoryStore::default())
            .build();
        let err = handoff
            .handle(&RequestContext::new(), &deposit_headers("abc"), BODY)
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::NotConfigured { what: "app secret" });
    }

    #[tokio::test]
    async fn missing_store_is_not_configured() {
        let handoff = Handoff::builder(HandoffConfig::new().app_secret("s3cret")).build();
        let ctx = RequestContext::new();

        let err = handoff.handle(&ctx, &deposit_headers("abc"), BODY).await.unwrap_err();
        assert_eq!(err, HandoffError::NotConfigured { what: "store" });

        let err = handoff.claim(&ctx, "abc").await.unwrap_err();
        assert_eq!(err, HandoffError::NotConfigured { what: "store" });
    }

    #[tokio::test]
    async fn half_configured_store_is_not_configured() {
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let store = FnStore::new().with_setter(move |_ctx, _key, _value| {
            *counter.lock().unwrap() += 1;
            async { Ok::<(), StoreError>(()) }
        });
        let handoff = Handoff::builder(HandoffConfig::new().app_secret("s3cret"))
            .store(store)
            .build();
        let ctx = RequestContext::new();

        let err = handoff.claim(&ctx, "abc").await.unwrap_err();
        assert_eq!(err, HandoffError::NotConfigured { what: "store" });
        assert_eq!(err.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        let err = handoff.deposit(&ctx, "abc", BODY).await.unwrap_err();
        assert_eq!(err, HandoffError::NotConfigured { what: "store" });
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unbounded_body_limit_accepts_deposit() {
        let handoff = Handoff::builder(
            HandoffConfig::new()
                .app_secret("s3cret")
                .max_body_size(usize::MAX),
        )
        .store(MemoryStore::default())
        .build();
        let ctx = RequestContext::new();

        let outcome = handoff.handle(&ctx, &deposit_headers("abc"), BODY).await.unwrap();
        assert_eq!(outcome, Outcome::Deposited);
        assert!(handoff.claim(&ctx, "abc").await.is_ok());
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let err = handoff()
            .handle(&RequestContext::new(), &deposit_headers("abc"), tokio::io::empty())
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::bad_request("empty body"));
    }

    #[tokio::test]
    async fn oversized_body_is_bad_request() {
        let handoff = Handoff::builder(HandoffConfig::new().app_secret("s3cret").max_body_size(16))
            .store(MemoryStore::default())
            .build();
        let err = handoff
            .handle(&RequestContext::new(), &deposit_headers("abc"), BODY)
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::bad_request("body exceeds 16 bytes"));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let err = handoff()
            .deposit(&RequestContext::new(), "abc", b"{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn missing_secret_field_is_unauthorized() {
        let err = handoff()
            .deposit(&RequestContext::new(), "abc", br#"{"data":{"x":1}}"#)
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::Unauthorized);
    }

    #[tokio::test]
    async fn custom_header_names() {
        let handoff = Handoff::builder(
            HandoffConfig::new()
                .app_secret("s3cret")
                .id_header("x-id")
                .claim_header("x-claim"),
        )
        .store(MemoryStore::default())
        .build();
        let ctx = RequestContext::new();

        let headers: Headers = [("X-Id", "abc")].into_iter().collect();
        handoff.handle(&ctx, &headers, BODY).await.unwrap();

        let headers: Headers = [("X-Id", "abc"), ("X-Claim", "1")].into_iter().collect();
        let outcome = handoff.handle(&ctx, &headers, tokio::io::empty()).await.unwrap();
        assert!(matches!(outcome, Outcome::Claimed(_)));
    }

    #[tokio::test]
    async fn store_failure_is_wrapped() {
        let store = FnStore::new()
            .with_setter(|_ctx, _key, _value| async {
                Err::<(), _>(StoreError::Backend("redis down".into()))
            })
            .with_getter(|_ctx, _key| async {
                Err::<Vec<u8>, _>(StoreError::Backend("redis down".into()))
            });
        let handoff = Handoff::builder(HandoffConfig::new().app_secret("s3cret"))
            .store(store)
            .build();
        let ctx = RequestContext::new();

        let err = handoff.deposit(&ctx, "abc", BODY).await.unwrap_err();
        assert_eq!(
            err,
            HandoffError::Store {
                op: StoreOp::Set,
                key: "abc".into(),
                source: StoreError::Backend("redis down".into()),
            }
        );
        // Never echoes the payload
        assert!(!err.to_string().contains("x\":1"));

        let err = handoff.claim(&ctx, "abc").await.unwrap_err();
        assert!(matches!(err, HandoffError::Store { op: StoreOp::Get, .. }));
    }

    #[tokio::test]
    async fn cancelled_context_is_cancelled() {
        let handoff = handoff();
        let ctx = RequestContext::new();
        ctx.cancel();

        assert_eq!(
            handoff.deposit(&ctx, "abc", BODY).await.unwrap_err(),
            HandoffError::Cancelled
        );
        assert_eq!(handoff.claim(&ctx, "abc").await.unwrap_err(), HandoffError::Cancelled);
    }

    #[tokio::test]
    async fn hook_sees_every_failure_and_no_success() {
        let seen: Arc<Mutex<Vec<HandoffError>>> = Arc::default();
        let sink = seen.clone();
        let handoff = Handoff::builder(HandoffConfig::new().app_secret("s3cret"))
            .store(MemoryStore::default())
            .on_error(move |_ctx, err| sink.lock().unwrap().push(err.clone()))
            .build();
        let ctx = RequestContext::new();

        handoff.deposit(&ctx, "abc", BODY).await.unwrap();
        handoff.claim(&ctx, "abc").await.unwrap();
        assert!(seen.lock().unwrap().is_empty());

        let returned = handoff.claim(&ctx, "abc").await.unwrap_err();
        let _ = handoff.deposit(&ctx, "", BODY).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![returned, HandoffError::bad_request("missing correlation id")]
        );
    }
}
