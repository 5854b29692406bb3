use std::fmt;

use handoff_store::StoreError;

/// Which store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// `set` during a deposit.
    Set,
    /// `get` during a claim.
    Get,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOp::Set => f.write_str("set"),
            StoreOp::Get => f.write_str("get"),
        }
    }
}

/// Protocol-level errors for the handoff.
///
/// `Unauthorized` deliberately carries no detail: a wrong secret, an unknown
/// id, an expired entry and an already-claimed entry all look the same to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoffError {
    #[error("not configured: {what}")]
    NotConfigured { what: &'static str },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("request cancelled")]
    Cancelled,

    #[error("store {op} failed for key {key}: {source}")]
    Store {
        op: StoreOp,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl HandoffError {
    pub(crate) fn bad_request(reason: impl Into<String>) -> Self {
        HandoffError::BadRequest {
            reason: reason.into(),
        }
    }

    /// Map a store error onto the protocol taxonomy.
    ///
    /// Not-found becomes `Unauthorized`, cancellation stays `Cancelled` and
    /// a store missing a half is `NotConfigured`. Everything else is wrapped
    /// with the operation and key.
    pub(crate) fn from_store(op: StoreOp, key: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => HandoffError::Unauthorized,
            StoreError::Cancelled => HandoffError::Cancelled,
            StoreError::Unconfigured { .. } => HandoffError::NotConfigured { what: "store" },
            source => HandoffError::Store {
                op,
                key: key.to_string(),
                source,
            },
        }
    }

    /// HTTP status a host server should answer with.
    pub fn status(&self) -> http::StatusCode {
        match self {
            HandoffError::NotConfigured { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
            HandoffError::BadRequest { .. } => http::StatusCode::BAD_REQUEST,
            HandoffError::Unauthorized => http::StatusCode::UNAUTHORIZED,
            HandoffError::Cancelled => http::StatusCode::SERVICE_UNAVAILABLE,
            HandoffError::Store { .. } => http::StatusCode::BAD_GATEWAY,
        }
    }
}
