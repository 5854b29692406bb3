use serde::Serialize;
use std::io::Write;

/// Emit a JSONL event to stdout (flushed immediately for piped output).
pub fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();
    }
}

// ── Session events ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventStarted {
    pub event: &'static str,
    pub mode: String,
    pub ttl_s: f64,
    pub sweep_s: f64,
}

impl EventStarted {
    pub fn new(mode: &str, ttl_s: f64, sweep_s: f64) -> Self {
        Self {
            event: "started",
            mode: mode.to_string(),
            ttl_s,
            sweep_s,
        }
    }
}

// ── Race events ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventRace {
    pub event: &'static str,
    pub round: u32,
    pub claimers: u32,
    pub winners: u32,
    pub refused: u32,
    pub other_errors: u32,
    pub elapsed_s: f64,
}

// ── Burst events ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventBurst {
    pub event: &'static str,
    pub deposits: u32,
    pub deposit_failures: u32,
    pub claims: u32,
    pub claim_failures: u32,
    pub deposit_ms: f64,
    pub claim_ms: f64,
    pub ops_per_s: f64,
}

// ── Expiry events ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventExpiry {
    pub event: &'static str,
    pub staged: u32,
    pub held_before: usize,
    pub held_after: usize,
    pub refused_claims: u32,
    pub waited_s: f64,
}

// ── Summary ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventSummary {
    pub event: &'static str,
    pub mode: String,
    pub passed: bool,
    pub elapsed_s: f64,
}
