mod burst;
mod common;
mod events;
mod expiry;
mod race;

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use common::elapsed_s;
use events::{emit, EventSummary};

#[derive(Parser)]
#[command(name = "handoff-stress", about = "Stress test for the deposit/claim handoff")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Many concurrent claims for one deposit; exactly one must win.
    Race {
        /// Concurrent claimers per round.
        #[arg(long, default_value = "64")]
        claimers: u32,
        /// Number of rounds.
        #[arg(long, default_value = "10")]
        rounds: u32,
    },

    /// Deposit N payloads, then claim them all (throughput test).
    Burst {
        /// Number of deposits.
        #[arg(long, default_value = "10000")]
        count: u32,
        /// Filler bytes per payload.
        #[arg(long, default_value = "256")]
        payload_size: usize,
    },

    /// Stage payloads that are never claimed; the sweeper must evict them.
    Expiry {
        /// Number of deposits.
        #[arg(long, default_value = "100")]
        count: u32,
        /// Entry TTL in ms.
        #[arg(long, default_value = "2000")]
        ttl_ms: u64,
        /// Sweep interval in ms.
        #[arg(long, default_value = "500")]
        sweep_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    eprintln!("handoff-stress v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();

    let (mode, passed) = match cli.command {
        Command::Race { claimers, rounds } => {
            let passed = race::run(race::RaceConfig { claimers, rounds }, start).await?;
            ("race", passed)
        }

        Command::Burst {
            count,
            payload_size,
        } => {
            let passed = burst::run(burst::BurstConfig {
                count,
                payload_size,
            })
            .await?;
            ("burst", passed)
        }

        Command::Expiry {
            count,
            ttl_ms,
            sweep_ms,
        } => {
            let passed = expiry::run(expiry::ExpiryConfig {
                count,
                ttl: Duration::from_millis(ttl_ms),
                sweep_interval: Duration::from_millis(sweep_ms),
            })
            .await?;
            ("expiry", passed)
        }
    };

    emit(&EventSummary {
        event: "summary",
        mode: mode.to_string(),
        passed,
        elapsed_s: elapsed_s(start),
    });
    eprintln!("\n{mode}: {}", if passed { "PASS" } else { "FAIL" });

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
