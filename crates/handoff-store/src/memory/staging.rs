/// StagingMap: the entries behind the in-memory store.
///
/// Pure state machine: stage, take, sweep. No locking and no clock.
/// The caller passes `now` and serializes access.
use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::types::{StagedEntry, StoreEvent, TakeOutcome};

/// Staged payloads by correlation key.
#[derive(Debug, Default)]
pub struct StagingMap {
    entries: HashMap<String, StagedEntry>,
}

impl StagingMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a payload, replacing any previous entry for `key`.
    pub fn stage(
        &mut self,
        key: String,
        payload: Vec<u8>,
        now: Instant,
        ttl: Duration,
    ) -> StoreEvent {
        let entry = StagedEntry::new(payload, now, ttl);
        let replaced = self.entries.insert(key.clone(), entry).is_some();
        StoreEvent::Staged { key, replaced }
    }

    /// Remove the entry for `key` and return its payload if it was still live.
    ///
    /// Expired entries are removed as well, so a stale entry is never
    /// observed twice.
    pub fn take(&mut self, key: &str, now: Instant) -> TakeOutcome {
        match self.entries.remove(key) {
            Some(entry) if entry.is_expired(now) => TakeOutcome::Expired,
            Some(entry) => TakeOutcome::Claimed(entry.payload),
            None => TakeOutcome::Absent,
        }
    }

    /// Whether a live entry exists for `key`. Does not remove anything.
    pub fn contains(&self, key: &str, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Look at an entry without consuming it.
    pub fn peek(&self, key: &str) -> Option<&StagedEntry> {
        self.entries.get(key)
    }

    /// Remove every entry with `expires_at <= now`.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<StoreEvent> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }

        expired
            .into_iter()
            .map(|key| StoreEvent::Expired { key })
            .collect()
    }

    /// Number of entries, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
