//! Draw Keeper Service
//!
//! Declares the global draw for every scheduled slot once its time of day
//! has passed on the local clock.
//!
//! # Architecture
//!
//! 1. Load `KeeperConfig` (JSON file named by `KEEPER_CONFIG`, else defaults)
//! 2. Open the store and build the engine
//! 3. Every poll, trigger each due slot for today; declarations are
//!    idempotent, so a restart or a second keeper is harmless
//! 4. Stop on Ctrl-C
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=info KEEPER_CONFIG=keeper.json cargo run -p keeper
//! ```

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use draw_core::{normalize_slot, time_of_day};
use draw_engine::{DrawEngine, DrawOutcome, EngineConfig, Scope, Store};

// ── Configuration ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// sqlx SQLite URL, e.g. `sqlite://draws.db`.
    pub database_url: String,
    pub poll_interval_secs: u64,
    /// Daily draw slots, any spelling `normalize_slot` accepts.
    pub slots: Vec<String>,
    /// If true, reports due slots but declares nothing.
    pub dry_run: bool,
    pub engine: EngineConfig,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://draws.db".to_string(),
            poll_interval_secs: 30,
            slots: vec![
                "11:45 AM".to_string(),
                "03:15 PM".to_string(),
                "08:45 PM".to_string(),
            ],
            dry_run: false,
            engine: EngineConfig::default(),
        }
    }
}

// ── Schedule ────────────────────────────────────────────────────

/// Canonical slots whose time of day is at or before `now`.
/// Slots that do not parse as a clock time are never due.
pub fn due_slots(slots: &[String], now: NaiveTime) -> Vec<String> {
    let mut due = Vec::new();
    for raw in slots {
        let slot = normalize_slot(raw);
        match time_of_day(&slot) {
            Some(at) if at <= now => {
                if !due.contains(&slot) {
                    due.push(slot);
                }
            }
            Some(_) => {}
            None => debug!("ignoring unparseable slot {:?}", raw),
        }
    }
    due
}

/// Slots already settled today, so a poll does not hit the store for them
/// again. Cleared when the date rolls over.
#[derive(Debug, Default)]
struct Settled {
    date: Option<NaiveDate>,
    slots: HashSet<String>,
}

impl Settled {
    fn roll(&mut self, today: NaiveDate) {
        if self.date != Some(today) {
            self.date = Some(today);
            self.slots.clear();
        }
    }

    fn contains(&self, slot: &str) -> bool {
        self.slots.contains(slot)
    }

    fn insert(&mut self, slot: String) {
        self.slots.insert(slot);
    }
}

async fn handle_slot(engine: &DrawEngine, config: &KeeperConfig, slot: &str, today: NaiveDate) -> bool {
    if config.dry_run {
        match engine.get_declared_result(Scope::Global, slot, today).await {
            Ok(Some(result)) => {
                info!("  {} already declared ({} winners)", slot, result.winners.len());
                return true;
            }
            Ok(None) => info!("  {} due (dry run, not declaring)", slot),
            Err(e) => warn!("  {} lookup failed: {}", slot, e),
        }
        return false;
    }

    match engine.trigger_draw(Scope::Global, slot, Some(today)).await {
        Ok(DrawOutcome::Withheld { .. }) => {
            info!("  {} withheld, no tickets yet", slot);
            false
        }
        Ok(outcome) => {
            if let Some(result) = outcome.result() {
                info!(
                    "  {} {}: {} winners, {} points wagered, digest {}",
                    slot,
                    outcome.label(),
                    result.winners.len(),
                    result.total_points,
                    result.digest
                );
            }
            true
        }
        Err(e) if e.is_retryable() => {
            warn!("  {} trigger failed, retrying next poll: {}", slot, e);
            false
        }
        Err(e) => {
            error!("  {} trigger failed: {}", slot, e);
            false
        }
    }
}

// ── Main ────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Draw keeper starting...");

    let config = load_config();
    info!(
        "DB={}, poll={}s, slots={:?}, dry_run={}",
        config.database_url, config.poll_interval_secs, config.slots, config.dry_run
    );

    let store = match Store::connect(&config.database_url).await {
        Ok(s) => s,
        Err(e) => {
            error!("Store connection failed: {}", e);
            std::process::exit(1);
        }
    };
    let engine = match DrawEngine::new(store.clone(), config.engine.clone()) {
        Ok(e) => e,
        Err(e) => {
            error!("Invalid engine config: {}", e);
            std::process::exit(1);
        }
    };

    let poll_interval = Duration::from_secs(config.poll_interval_secs.max(1));
    let mut iteration = 0u64;
    let mut settled = Settled::default();

    loop {
        iteration += 1;
        let now = Local::now();
        let today = now.date_naive();
        settled.roll(today);
        debug!("── Poll #{} ({}) ──", iteration, now.format("%Y-%m-%d %H:%M:%S"));

        for slot in due_slots(&config.slots, now.time()) {
            if settled.contains(&slot) {
                continue;
            }
            if handle_slot(&engine, &config, &slot, today).await {
                settled.insert(slot);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    store.close().await;
}

fn load_config() -> KeeperConfig {
    let path = std::env::var("KEEPER_CONFIG").unwrap_or_default();
    if !path.is_empty() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<KeeperConfig>(&contents) {
                Ok(config) => return config,
                Err(e) => warn!("Invalid config {}: {}", path, e),
            }
        }
        warn!("Failed to load config from {}, using defaults", path);
    }
    KeeperConfig::default()
}

// ── Tests ───────────────────────────────────────────────────────
