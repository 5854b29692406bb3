use std::time::Instant;

use handoff_protocol::{Handoff, HandoffConfig};
use handoff_store::{MemoryStore, StoreConfig, SweeperHandle};

/// Secret shared by every scenario's depositor and handler.
pub const STRESS_SECRET: &str = "handoff-stress-secret";

/// Elapsed seconds since `start`.
pub fn elapsed_s(start: Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

/// A handler over a fresh in-memory store with its sweeper running.
///
/// Returns the store as well so scenarios can inspect what it holds.
pub fn build(store_config: StoreConfig) -> (Handoff, MemoryStore, SweeperHandle) {
    let (store, sweeper) = MemoryStore::spawn(store_config);
    let handoff = Handoff::builder(HandoffConfig::new().app_secret(STRESS_SECRET))
        .store(store.clone())
        .error_hook(handoff_protocol::TracingHook)
        .build();
    (handoff, store, sweeper)
}

/// Deposit body carrying `size` bytes of filler in `data`.
pub fn deposit_body(seq: u32, size: usize) -> Vec<u8> {
    let filler: String = (0..size)
        .map(|i| char::from(b'a' + ((i + seq as usize) % 26) as u8))
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "metadata": {"appSecret": STRESS_SECRET},
        "data": {"seq": seq, "filler": filler},
    }))
    .unwrap_or_default()
}

/// Fresh correlation id.
pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
