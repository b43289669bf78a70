//! Ledger subject: a shop account with a point balance and commission rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,

    /// Signed point balance. Kept at full precision; rounded only when
    /// reported.
    pub balance: Decimal,

    /// Commission percentage kept by the shop on every ticket it prints.
    pub commission: Decimal,
}

impl Account {
    /// Commission earned on `points` wagered.
    pub fn commission_on(&self, points: Decimal) -> Decimal {
        points * self.commission / Decimal::ONE_HUNDRED
    }

    /// What the shop actually owes for a ticket of `points`.
    pub fn net_of_commission(&self, points: Decimal) -> Decimal {
        points - self.commission_on(points)
    }
}

/// Round a decimal for reporting (2 fractional digits).
pub fn report(value: Decimal) -> Decimal {
    value.round_dp(2)
}
