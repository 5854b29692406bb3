use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-request context handed to every store operation.
///
/// Carries a request id for log correlation and a cancellation token. A
/// context whose token is cancelled makes store operations fail with
/// [`StoreError::Cancelled`](crate::StoreError::Cancelled) without touching
/// any entry.
///
/// Cheap to clone; clones share the same token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    token: CancellationToken,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Fresh context with a random request id and its own token.
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Context bound to an existing token (e.g. the server's shutdown token).
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token,
        }
    }

    /// Request id used in log lines.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
