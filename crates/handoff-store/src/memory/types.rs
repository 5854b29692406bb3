/// Staging store types: entries, configuration, events.
use std::time::Duration;

use tokio::time::Instant;

// ── Constants ────────────────────────────────────────────────────────────

/// Default entry lifetime (1 minute).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default interval between background sweeps (5 seconds).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Floor for the sweep interval. `tokio::time::interval` rejects zero.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

// ── Types ────────────────────────────────────────────────────────────────

/// A staged payload waiting to be claimed.
#[derive(Debug, Clone)]
pub struct StagedEntry {
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Absolute expiry: insertion instant plus ttl.
    pub expires_at: Instant,
}

impl StagedEntry {
    /// Create a new entry expiring `ttl` after `now`.
    pub fn new(payload: Vec<u8>, now: Instant, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: now + ttl,
        }
    }

    /// Whether this entry has expired. An entry is live strictly before `expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Result of a destructive read on the staging map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeOutcome {
    /// The entry was live; it has been removed and its payload is returned.
    Claimed(Vec<u8>),
    /// The entry existed but had expired; it has been removed.
    Expired,
    /// No entry for the key.
    Absent,
}

/// Events emitted by the staging map, used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A payload was staged. `replaced` is true if it overwrote a previous entry.
    Staged { key: String, replaced: bool },
    /// A payload expired and was removed.
    Expired { key: String },
}

/// Configuration for a [`MemoryStore`](super::MemoryStore).
///
/// ```rust
/// use std::time::Duration;
/// use handoff_store::StoreConfig;
///
/// let config = StoreConfig::new()
///     .ttl(Duration::from_secs(30))
///     .sweep_interval(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub(crate) ttl: Duration,
    pub(crate) sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConfig {
    /// Defaults: 1 minute TTL, 5 second sweep.
    pub fn new() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set the entry lifetime (default: 1 minute).
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep interval (default: 5 seconds, floor: 10 ms).
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(MIN_SWEEP_INTERVAL);
        self
    }

    /// Configured entry lifetime.
    pub fn entry_ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured sweep interval.
    pub fn sweep_every(&self) -> Duration {
        self.sweep_interval
    }
}
