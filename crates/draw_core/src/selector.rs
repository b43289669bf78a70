//! Winner selection under a payout budget.
//!
//! Greedy bounded knapsack over a single scalar capacity (total winning
//! quantity the budget can pay for). Not an optimal allocation: it always
//! declares at least one winner when any wager exists, even if that means
//! exceeding the nominal budget at the margin.

use serde::{Deserialize, Serialize};

use crate::wager::{Combination, Wager};

/// One line of a declared result: a combination, the aggregate quantity
/// wagered on it, and the points that quantity pays out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawEntry {
    pub combination: Combination,
    pub quantity: u64,
    pub value: u64,
}

impl DrawEntry {
    pub fn winner(combination: Combination, quantity: u64, unit_payout: u64) -> Self {
        Self {
            combination,
            quantity,
            value: quantity.saturating_mul(unit_payout),
        }
    }

    /// A zero-quantity display entry.
    pub fn filler(combination: Combination) -> Self {
        Self {
            combination,
            quantity: 0,
            value: 0,
        }
    }
}

/// Maximum aggregate quantity a budget can pay for.
pub fn quantity_capacity(payout_budget: u64, unit_payout: u64) -> u64 {
    payout_budget.checked_div(unit_payout).unwrap_or(0)
}

/// Select winners from aggregated totals.
///
/// 1. Descending pass: admit every combination whose quantity still fits.
/// 2. Ascending pass over the rest to use leftover capacity.
/// 3. Nothing admitted but candidates exist → force the smallest one. When
///    several share the smallest quantity, the last of them in key order.
///
/// Ties keep key order. The result is in admission order.
pub fn select_winners(totals: &Wager, payout_budget: u64, unit_payout: u64) -> Vec<DrawEntry> {
    if totals.is_empty() {
        return Vec::new();
    }

    let mut remaining = quantity_capacity(payout_budget, unit_payout);
    let candidates: Vec<(&Combination, u64)> = totals.iter().map(|(c, q)| (c, *q)).collect();
    let mut admitted = vec![false; candidates.len()];
    let mut winners = Vec::new();

    // Stable sorts: equal quantities stay in key order.
    let mut descending: Vec<usize> = (0..candidates.len()).collect();
    descending.sort_by(|a, b| candidates[*b].1.cmp(&candidates[*a].1));
    let mut ascending: Vec<usize> = (0..candidates.len()).collect();
    ascending.sort_by_key(|i| candidates[*i].1);

    for &i in &descending {
        if remaining == 0 {
            break;
        }
        let (combination, qty) = candidates[i];
        if qty <= remaining {
            winners.push(DrawEntry::winner(combination.clone(), qty, unit_payout));
            admitted[i] = true;
            remaining -= qty;
        }
    }

    if remaining > 0 {
        for &i in &ascending {
            if remaining == 0 {
                break;
            }
            if admitted[i] {
                continue;
            }
            let (combination, qty) = candidates[i];
            if qty <= remaining {
                winners.push(DrawEntry::winner(combination.clone(), qty, unit_payout));
                admitted[i] = true;
                remaining -= qty;
            }
        }
    }

    // Tail of the descending order: smallest quantity, last key among ties.
    if winners.is_empty() {
        if let Some(&smallest) = descending.last() {
            let (combination, qty) = candidates[smallest];
            winners.push(DrawEntry::winner(combination.clone(), qty, unit_payout));
        }
    }

    winners
}

/// Sum of `value` across entries.
pub fn total_value(entries: &[DrawEntry]) -> u64 {
    entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, u64)]) -> Wager {
        pairs
            .iter()
            .map(|(k, q)| (Combination::parse(k).unwrap(), *q))
            .collect()
    }

    fn keys(entries: &[DrawEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.combination.as_str()).collect()
    }

    #[test]
    fn test_capacity() {
        assert_eq!(quantity_capacity(1_440, 180), 8);
        assert_eq!(quantity_capacity(1_439, 180), 7);
        assert_eq!(quantity_capacity(100, 0), 0);
    }

    #[test]
    fn test_descending_pass_fills_budget() {
        // A=1001:5, B=1002:3, C=1003:20 with capacity 8
        let t = totals(&[("1001", 5), ("1002", 3), ("1003", 20)]);
        let w = select_winners(&t, 8 * 180, 180);
        assert_eq!(keys(&w), vec!["1001", "1002"]);
        assert_eq!(w.iter().map(|e| e.quantity).sum::<u64>(), 8);
        assert_eq!(w[0].value, 5 * 180);
    }

    #[test]
    fn test_small_items_fill_leftover() {
        // capacity 10: 7 fits (rem 3), both 4s are skipped, 2 then 1 fill it.
        let t = totals(&[("1001", 7), ("1002", 4), ("1003", 4), ("1004", 2), ("1005", 1)]);
        let w = select_winners(&t, 10 * 180, 180);
        assert_eq!(keys(&w), vec!["1001", "1004", "1005"]);
        assert_eq!(w.iter().map(|e| e.quantity).sum::<u64>(), 10);
    }

    #[test]
    fn test_forced_fallback_with_zero_capacity() {
        let t = totals(&[("1001", 5), ("3002", 3), ("5003", 20)]);
        let w = select_winners(&t, 0, 180);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].combination.as_str(), "3002");
        assert_eq!(w[0].value, 3 * 180);
    }

    #[test]
    fn test_forced_fallback_tie_takes_last_key() {
        let t = totals(&[("1001", 1), ("3002", 1)]);
        let w = select_winners(&t, 0, 180);
        assert_eq!(keys(&w), vec!["3002"]);

        let t = totals(&[("1001", 4), ("3002", 2), ("5003", 2), ("5004", 9)]);
        let w = select_winners(&t, 180, 180);
        assert_eq!(keys(&w), vec!["5003"]);
    }

    #[test]
    fn test_forced_fallback_budget_below_smallest() {
        let t = totals(&[("1001", 5), ("1002", 9)]);
        let w = select_winners(&t, 4 * 180, 180);
        assert_eq!(keys(&w), vec!["1001"]);
    }

    #[test]
    fn test_ties_keep_key_order() {
        let t = totals(&[("3001", 2), ("1001", 2), ("5001", 2)]);
        let w = select_winners(&t, 4 * 180, 180);
        assert_eq!(keys(&w), vec!["1001", "3001"]);
    }

    #[test]
    fn test_empty_totals() {
        assert!(select_winners(&Wager::new(), 10_000, 180).is_empty());
    }

    #[test]
    fn test_total_value() {
        let t = totals(&[("1001", 5), ("1002", 3)]);
        let w = select_winners(&t, 8 * 180, 180);
        assert_eq!(total_value(&w), 8 * 180);
    }
}
