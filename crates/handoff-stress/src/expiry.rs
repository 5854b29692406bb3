use std::time::{Duration, Instant};

use handoff_protocol::HandoffError;
use handoff_store::{RequestContext, StoreConfig};

use crate::common::{build, correlation_id, deposit_body};
use crate::events::*;

pub struct ExpiryConfig {
    pub count: u32,
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

/// Stage `count` payloads, never claim them, wait past TTL plus one sweep.
/// Passes if the sweeper emptied the store and every late claim was refused.
pub async fn run(config: ExpiryConfig) -> anyhow::Result<bool> {
    let store_config = StoreConfig::new()
        .ttl(config.ttl)
        .sweep_interval(config.sweep_interval);
    emit(&EventStarted::new(
        "expiry",
        store_config.entry_ttl().as_secs_f64(),
        store_config.sweep_every().as_secs_f64(),
    ));

    let (handoff, store, sweeper) = build(store_config.clone());

    let mut ids = Vec::with_capacity(config.count as usize);
    for seq in 1..=config.count {
        let id = correlation_id();
        handoff
            .deposit(&RequestContext::new(), &id, &deposit_body(seq, 32))
            .await?;
        ids.push(id);
    }
    let held_before = store.len().await;

    let wait = store_config.entry_ttl() + store_config.sweep_every() + Duration::from_millis(50);
    eprintln!(
        "Expiry mode → {} staged, waiting {:.1}s for the sweeper",
        ids.len(),
        wait.as_secs_f64()
    );
    let wait_start = Instant::now();
    tokio::time::sleep(wait).await;
    let held_after = store.len().await;

    let mut refused_claims = 0u32;
    for id in &ids {
        if let Err(HandoffError::Unauthorized) = handoff.claim(&RequestContext::new(), id).await {
            refused_claims += 1;
        }
    }

    emit(&EventExpiry {
        event: "expiry",
        staged: ids.len() as u32,
        held_before,
        held_after,
        refused_claims,
        waited_s: wait_start.elapsed().as_secs_f64(),
    });

    sweeper.shutdown().await;
    Ok(held_after == 0 && refused_claims == config.count)
}
