/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a store adapter.
///
/// `NotFound` is the only variant the protocol layer treats as an expected
/// outcome. Everything else is surfaced as a store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no live entry for key: {key}")]
    NotFound { key: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("store {missing} is not configured")]
    Unconfigured { missing: &'static str },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a `NotFound` error on `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        StoreError::NotFound { key: key.into() }
    }

    /// Whether this error means "no live entry" (absent, expired or consumed).
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
