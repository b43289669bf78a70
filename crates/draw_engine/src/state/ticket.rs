//! Printed tickets.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use draw_core::{parse_wager_any, Wager};

use super::Scope;

/// A printed ticket. Immutable once stored.
///
/// **Invariant**: `total_points` is the wager's total quantity times the
/// unit stake in effect at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,

    /// Shop account that printed (and paid for) the ticket.
    pub account_id: i64,

    /// Result space the ticket is drawn and claimed in.
    pub scope: Scope,

    /// Day whose draws the ticket takes part in.
    pub draw_date: NaiveDate,

    /// Normalized slots (`HH:MM AM|PM`), at least one.
    pub slots: Vec<String>,

    /// Wager text as printed, e.g. `"10-05:2,30-11:1"`.
    pub wager: String,

    pub total_points: i64,

    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Parsed wager. Malformed text yields an empty wager.
    pub fn parsed_wager(&self) -> Wager {
        parse_wager_any(&self.wager)
    }

    pub fn references_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }
}

/// Input for printing a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub account_id: i64,
    pub scope: Scope,
    pub draw_date: NaiveDate,
    /// Raw slots as entered; normalized on issue.
    pub slots: Vec<String>,
    pub wager: String,
}

/// Ticket issuance receipt. Decimal fields are rounded to 2 places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    pub commission_rate: Decimal,
    pub commission_earned: Decimal,
    pub net_debit: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_core::Combination;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: 1,
            account_id: 9,
            scope: Scope::Global,
            draw_date: NaiveDate::from_ymd_opt(2025, 7, 27).unwrap(),
            slots: vec!["08:45 PM".into(), "09:00 PM".into()],
            wager: "10-05:2,30-11:1".into(),
            total_points: 540,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parsed_wager() {
        let t = sample_ticket();
        let w = t.parsed_wager();
        assert_eq!(w[&Combination::parse("1005").unwrap()], 2);
        assert_eq!(w[&Combination::parse("3011").unwrap()], 1);
    }

    #[test]
    fn test_references_slot() {
        let t = sample_ticket();
        assert!(t.references_slot("08:45 PM"));
        assert!(!t.references_slot("8:45 PM"));
    }

    #[test]
    fn test_malformed_wager_is_empty() {
        let mut t = sample_ticket();
        t.wager = "???".into();
        assert!(t.parsed_wager().is_empty());
    }
}
