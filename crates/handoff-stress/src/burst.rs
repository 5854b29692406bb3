use std::time::{Duration, Instant};

use handoff_store::{RequestContext, StoreConfig};

use crate::common::{build, correlation_id, deposit_body};
use crate::events::*;

pub struct BurstConfig {
    pub count: u32,
    pub payload_size: usize,
}

/// Deposit `count` payloads, then claim them all. Measures throughput.
/// Passes if every deposit and every claim succeeded.
pub async fn run(config: BurstConfig) -> anyhow::Result<bool> {
    let store_config = StoreConfig::new();
    emit(&EventStarted::new(
        "burst",
        store_config.entry_ttl().as_secs_f64(),
        store_config.sweep_every().as_secs_f64(),
    ));
    eprintln!(
        "Burst mode → {} deposits x {} bytes",
        config.count, config.payload_size
    );

    let (handoff, store, sweeper) = build(store_config);

    // Phase 1: deposit everything
    let mut ids = Vec::with_capacity(config.count as usize);
    let mut deposit_failures = 0u32;
    let deposit_start = Instant::now();
    for seq in 1..=config.count {
        let id = correlation_id();
        match handoff
            .deposit(&RequestContext::new(), &id, &deposit_body(seq, config.payload_size))
            .await
        {
            Ok(()) => ids.push(id),
            Err(e) => {
                deposit_failures += 1;
                if deposit_failures <= 3 {
                    eprintln!("    deposit #{seq} failed: {e}");
                }
            }
        }
    }
    let deposit_elapsed = deposit_start.elapsed();
    eprintln!(
        "    staged {}/{} in {:.1}ms ({} held)",
        ids.len(),
        config.count,
        deposit_elapsed.as_secs_f64() * 1000.0,
        store.len().await
    );

    // Phase 2: claim everything back
    let mut claim_failures = 0u32;
    let claim_start = Instant::now();
    for id in &ids {
        if let Err(e) = handoff.claim(&RequestContext::new(), id).await {
            claim_failures += 1;
            if claim_failures <= 3 {
                eprintln!("    claim {id} failed: {e}");
            }
        }
    }
    let claim_elapsed = claim_start.elapsed();

    let total = deposit_elapsed + claim_elapsed;
    let ops = (ids.len() * 2) as f64;
    emit(&EventBurst {
        event: "burst",
        deposits: ids.len() as u32,
        deposit_failures,
        claims: ids.len() as u32 - claim_failures,
        claim_failures,
        deposit_ms: deposit_elapsed.as_secs_f64() * 1000.0,
        claim_ms: claim_elapsed.as_secs_f64() * 1000.0,
        ops_per_s: ops / total.max(Duration::from_micros(1)).as_secs_f64(),
    });

    let drained = store.is_empty().await;
    sweeper.shutdown().await;
    Ok(deposit_failures == 0 && claim_failures == 0 && drained)
}
