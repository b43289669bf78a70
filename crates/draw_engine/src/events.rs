//! Engine events for reporting.
//!
//! Each event is logged once, as JSON, on the `draw_engine::events` target
//! after its transaction commits. Reporting jobs tail that target.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::state::Scope;

/// Emitted when a result is newly declared (not on `AlreadyDeclared`).
#[derive(Debug, Clone, Serialize)]
pub struct DrawDeclared {
    pub result_id: i64,
    pub scope: Scope,
    pub slot: String,
    pub draw_date: NaiveDate,
    /// Points wagered across the slot's tickets.
    pub total_points: i64,
    /// Points the declared winners pay out in total.
    pub declared_payout: u64,
    pub winner_count: usize,
    /// Base64 SHA-256 of the declared content.
    pub digest: String,
}

/// Emitted when a claim is settled and the owner credited.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimSettled {
    pub claim_id: i64,
    pub ticket_id: i64,
    pub account_id: i64,
    pub total_payout: i64,
    /// Owner balance after the credit.
    pub balance: Decimal,
}

/// Emitted when a ticket is printed and the shop debited.
#[derive(Debug, Clone, Serialize)]
pub struct TicketIssued {
    pub ticket_id: i64,
    pub account_id: i64,
    pub scope: Scope,
    pub draw_date: NaiveDate,
    pub slots: Vec<String>,
    pub total_points: i64,
    pub net_debit: Decimal,
}

/// Anything the engine announces.
pub trait EngineEvent: Serialize {
    const NAME: &'static str;
}

impl EngineEvent for DrawDeclared {
    const NAME: &'static str = "draw_declared";
}

impl EngineEvent for ClaimSettled {
    const NAME: &'static str = "claim_settled";
}

impl EngineEvent for TicketIssued {
    const NAME: &'static str = "ticket_issued";
}

pub fn emit<E: EngineEvent>(event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => info!(target: "draw_engine::events", event = E::NAME, %payload),
        Err(e) => warn!(target: "draw_engine::events", event = E::NAME, "unserializable event: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_shape() {
        let event = ClaimSettled {
            claim_id: 1,
            ticket_id: 2,
            account_id: 3,
            total_payout: 360,
            balance: Decimal::new(136000, 2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["ticket_id"], 2);
        assert_eq!(json["balance"], "1360.00");
        assert_eq!(ClaimSettled::NAME, "claim_settled");
        emit(&event);
    }
}
