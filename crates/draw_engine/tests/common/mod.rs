#![allow(dead_code)]

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;

use draw_engine::{Account, DrawEngine, EngineConfig, IssuedTicket, NewTicket, Scope, Store};

pub const SHOP: i64 = 1;

pub fn draw_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 27).unwrap()
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// Engine on a fresh in-memory store with one shop (balance 10 000,
/// commission 10%) and the given winning percentage.
pub async fn engine_with(config: EngineConfig, rate: i64) -> DrawEngine {
    let store = Store::in_memory().await.unwrap();
    let engine = DrawEngine::new(store, config).unwrap();
    engine
        .register_account(&Account {
            id: SHOP,
            balance: Decimal::from(10_000),
            commission: Decimal::from(10),
        })
        .await
        .unwrap();
    engine.set_payout_rate(Decimal::from(rate)).await.unwrap();
    engine
}

pub async fn engine(rate: i64) -> DrawEngine {
    engine_with(EngineConfig::default(), rate).await
}

pub async fn issue(
    engine: &DrawEngine,
    scope: Scope,
    slots: &[&str],
    wager: &str,
) -> IssuedTicket {
    engine
        .issue_ticket(&NewTicket {
            account_id: SHOP,
            scope,
            draw_date: draw_day(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
            wager: wager.to_string(),
        })
        .await
        .unwrap()
}

pub async fn balance(engine: &DrawEngine, id: i64) -> Decimal {
    engine.store().get_account(id).await.unwrap().unwrap().balance
}
