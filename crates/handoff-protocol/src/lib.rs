//! Deposit/claim handoff protocol.
//!
//! A webhook deposits a payload under a correlation id, proving itself with
//! a shared app secret. A later request presenting the same id claims the
//! payload, exactly once. The secret is stripped before anything is stored.
//!
//! Wire format: JSON envelope `{"metadata": {"appSecret": ...}, "data": ...}`.
//! Storage: any [`Store`](handoff_store::Store); in-memory by default.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use handoff_protocol::{Handoff, HandoffConfig, Headers, Outcome};
//! use handoff_store::{RequestContext, StoreConfig};
//!
//! # async fn example() -> Result<(), handoff_protocol::HandoffError> {
//! let config = HandoffConfig::new().app_secret("s3cret");
//! let (handoff, sweeper) = Handoff::with_memory_store(config, StoreConfig::new());
//!
//! // Webhook: deposit
//! let headers: Headers = [("X-0account-Uuid", "abc")].into_iter().collect();
//! let body = br#"{"metadata":{"appSecret":"s3cret"},"data":{"x":1}}"#;
//! handoff.handle(&RequestContext::new(), &headers, &body[..]).await?;
//!
//! // User request: claim
//! let headers: Headers = [("x-0account-uuid", "abc"), ("x-0account-auth", "true")]
//!     .into_iter()
//!     .collect();
//! let outcome = handoff.handle(&RequestContext::new(), &headers, tokio::io::empty()).await?;
//! assert!(matches!(outcome, Outcome::Claimed(_)));
//!
//! sweeper.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod headers;
pub mod hook;
pub mod secret;

pub use config::{
    HandoffConfig, HttpClientConfig, APP_SECRET_ENV, DEFAULT_CLAIM_HEADER, DEFAULT_ID_HEADER,
    DEFAULT_MAX_BODY_SIZE,
};
pub use envelope::{Envelope, Metadata};
pub use error::{HandoffError, StoreOp};
pub use handler::{Handoff, HandoffBuilder, Outcome, Phase};
pub use headers::{HeaderValues, Headers};
pub use hook::{ErrorHook, TracingHook};
pub use secret::AppSecret;

pub use handoff_store::{RequestContext, Store, StoreError};
