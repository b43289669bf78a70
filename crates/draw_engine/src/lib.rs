//! # draw_engine
//!
//! Resolves numbers draws and settles claims against them.
//!
//! - A draw for (scope, slot, date) is declared at most once. Re-triggering
//!   returns the stored result unchanged.
//! - A ticket is claimed at most once, and the claim row and balance credit
//!   commit together or not at all.
//!
//! [`DrawEngine`] is the entry point; it owns a [`Store`] and an
//! [`EngineConfig`] and delegates to the `handle_*` functions.

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod state;
pub mod store;

use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

pub use config::{EmptySlotPolicy, EngineConfig};
pub use error::{EngineError, Result};
pub use state::account::Account;
pub use state::claim::{Claim, ClaimMatch, ClaimOutcome, TicketStatus};
pub use state::draw::{DrawOutcome, DrawResult};
pub use state::ticket::{IssuedTicket, NewTicket, Ticket};
pub use state::Scope;
pub use store::Store;

#[derive(Debug, Clone)]
pub struct DrawEngine {
    store: Store,
    config: EngineConfig,
}

impl DrawEngine {
    pub fn new(store: Store, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Draws ───────────────────────────────────────────────────

    /// Trigger the draw for `slot`. `draw_date` defaults to today on the
    /// local clock, the same clock slot times are read on.
    pub async fn trigger_draw(
        &self,
        scope: Scope,
        slot: &str,
        draw_date: Option<NaiveDate>,
    ) -> Result<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.trigger_draw_with_rng(scope, slot, draw_date, &mut rng)
            .await
    }

    /// Same as [`Self::trigger_draw`] with a caller-supplied random source
    /// for the filler entries.
    pub async fn trigger_draw_with_rng<R: Rng + ?Sized>(
        &self,
        scope: Scope,
        slot: &str,
        draw_date: Option<NaiveDate>,
        rng: &mut R,
    ) -> Result<DrawOutcome> {
        let draw_date = draw_date.unwrap_or_else(|| Local::now().date_naive());
        handlers::handle_trigger_draw(&self.store, &self.config, scope, slot, draw_date, rng).await
    }

    pub async fn get_declared_result(
        &self,
        scope: Scope,
        slot: &str,
        draw_date: NaiveDate,
    ) -> Result<Option<DrawResult>> {
        let slot = draw_core::normalize_slot(slot);
        self.store.lookup(scope, &slot, draw_date).await
    }

    pub async fn declared_results_on(&self, draw_date: NaiveDate) -> Result<Vec<DrawResult>> {
        self.store.results_on(draw_date).await
    }

    // ── Tickets & claims ────────────────────────────────────────

    pub async fn issue_ticket(&self, new: &NewTicket) -> Result<IssuedTicket> {
        handlers::handle_issue_ticket(&self.store, &self.config, new).await
    }

    pub async fn submit_claim(&self, ticket_id: i64) -> Result<ClaimOutcome> {
        handlers::handle_submit_claim(&self.store, ticket_id).await
    }

    pub async fn check_ticket(&self, ticket_id: i64) -> Result<TicketStatus> {
        handlers::handle_check_ticket(&self.store, ticket_id).await
    }

    /// Claims settled between two dates, inclusive.
    pub async fn claims_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Claim>> {
        if from > to {
            return Err(EngineError::validation(format!(
                "empty range {from}..={to}"
            )));
        }
        self.store.claims_between(from, to).await
    }

    // ── Administration ──────────────────────────────────────────

    /// Record a new winning percentage. Applies to draws declared from now
    /// on; declared results keep their own budget.
    pub async fn set_payout_rate(&self, percentage: Decimal) -> Result<()> {
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(EngineError::validation(format!(
                "payout rate {percentage} outside 0..=100"
            )));
        }
        self.store.set_payout_rate(percentage).await?;
        info!(%percentage, "payout rate updated");
        Ok(())
    }

    pub async fn register_account(&self, account: &Account) -> Result<()> {
        if account.id <= 0 {
            return Err(EngineError::validation(format!(
                "invalid account id {}",
                account.id
            )));
        }
        if account.commission < Decimal::ZERO || account.commission > Decimal::ONE_HUNDRED {
            return Err(EngineError::validation(format!(
                "commission {} outside 0..=100",
                account.commission
            )));
        }
        self.store.insert_account(account).await
    }
}
