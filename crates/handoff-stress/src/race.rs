use std::sync::Arc;
use std::time::Instant;

use handoff_protocol::HandoffError;
use handoff_store::{RequestContext, StoreConfig};

use crate::common::{build, correlation_id, deposit_body, elapsed_s};
use crate::events::*;

pub struct RaceConfig {
    pub claimers: u32,
    pub rounds: u32,
}

/// Deposit once, then fire `claimers` concurrent claims at the same id.
/// Passes if every round has exactly one winner.
pub async fn run(config: RaceConfig, start: Instant) -> anyhow::Result<bool> {
    let store_config = StoreConfig::new();
    emit(&EventStarted::new(
        "race",
        store_config.entry_ttl().as_secs_f64(),
        store_config.sweep_every().as_secs_f64(),
    ));
    eprintln!(
        "Race mode → {} claimers x {} rounds",
        config.claimers, config.rounds
    );

    let (handoff, _store, sweeper) = build(store_config);
    let handoff = Arc::new(handoff);
    let mut passed = true;

    for round in 1..=config.rounds {
        let id = correlation_id();
        handoff
            .deposit(&RequestContext::new(), &id, &deposit_body(round, 64))
            .await?;

        let mut tasks = Vec::with_capacity(config.claimers as usize);
        for _ in 0..config.claimers {
            let handoff = handoff.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                handoff.claim(&RequestContext::new(), &id).await
            }));
        }

        let (mut winners, mut refused, mut other_errors) = (0u32, 0u32, 0u32);
        for task in tasks {
            match task.await? {
                Ok(_) => winners += 1,
                Err(HandoffError::Unauthorized) => refused += 1,
                Err(e) => {
                    other_errors += 1;
                    eprintln!("    round {round}: unexpected error: {e}");
                }
            }
        }

        if winners != 1 || other_errors > 0 {
            passed = false;
        }
        emit(&EventRace {
            event: "race",
            round,
            claimers: config.claimers,
            winners,
            refused,
            other_errors,
            elapsed_s: elapsed_s(start),
        });
    }

    sweeper.shutdown().await;
    Ok(passed)
}
