//! Claims against declared results.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use draw_core::Combination;

/// One winning combination on a claimed ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMatch {
    pub combination: Combination,
    /// Slot whose declaration made this combination a winner.
    pub slot: String,
    /// Quantity wagered on the ticket (not the draw aggregate).
    pub quantity: u64,
    /// Unit payout recorded on the declaring result.
    pub unit_payout: u64,
    pub payout: u64,
}

/// A settled claim. At most one per ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub ticket_id: i64,
    /// Account credited with the payout.
    pub account_id: i64,
    pub draw_date: NaiveDate,
    pub slots: Vec<String>,
    pub matches: Vec<ClaimMatch>,
    pub total_payout: i64,
    pub claimed_at: DateTime<Utc>,
}

impl Claim {
    pub fn total_quantity(&self) -> u64 {
        self.matches.iter().map(|m| m.quantity).sum()
    }
}

/// Outcome of `DrawEngine::submit_claim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// Claim recorded and the owner credited. `balance` is the owner's
    /// balance after the credit, rounded to 2 places.
    Claimed { claim: Claim, balance: Decimal },
    /// The ticket was claimed before; nothing changed.
    AlreadyClaimed { claim: Claim },
    NotFound { ticket_id: i64 },
    /// At least one of the ticket's slots has no declaration yet. Retryable.
    NoDeclaration { missing_slots: Vec<String> },
    /// Every slot is declared and none of the ticket's combinations won.
    NoMatch { winning: Vec<Combination> },
}

impl ClaimOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Claimed { .. } => "claimed",
            Self::AlreadyClaimed { .. } => "already_claimed",
            Self::NotFound { .. } => "not_found",
            Self::NoDeclaration { .. } => "no_declaration",
            Self::NoMatch { .. } => "no_match",
        }
    }
}

/// Read-only preview of what claiming a ticket would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TicketStatus {
    Winning {
        matches: Vec<ClaimMatch>,
        total_payout: i64,
    },
    AlreadyClaimed { claim: Claim },
    NotFound { ticket_id: i64 },
    NoDeclaration { missing_slots: Vec<String> },
    NoMatch { winning: Vec<Combination> },
}
