//! Wager strings → typed combination quantities.
//!
//! Terminals print wagers as free text, e.g. `"10-01:4,30-02:8"`. Everything
//! past this module works on [`Wager`]; the parsers here never fail; a bad
//! entry is skipped so one broken ticket cannot abort a draw run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::SERIES_PREFIX_LEN;

/// A wagered number, stored as its digit string (`"1001"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination(String);

impl Combination {
    /// Build a combination from a raw key, dropping `-` separators.
    /// Returns `None` unless what remains is a non-empty run of ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw.trim().chars().filter(|c| *c != '-').collect();
        Self::from_digits(key)
    }

    /// Like [`Combination::parse`] but strips every non-digit character.
    /// Used for keys coming out of JSON objects.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let key: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        Self::from_digits(key)
    }

    fn from_digits(key: String) -> Option<Self> {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The series prefix (two leading digits), if the key is long enough.
    pub fn series(&self) -> Option<&str> {
        self.0.get(..SERIES_PREFIX_LEN)
    }

    pub fn in_series(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Combination → quantity. Ordered by key, which is also the encounter
/// order the selector uses to break ties.
pub type Wager = BTreeMap<Combination, u64>;

/// Total quantity across every combination of a wager.
pub fn total_quantity(wager: &Wager) -> u64 {
    wager.values().fold(0u64, |acc, q| acc.saturating_add(*q))
}

/// Add every entry of `other` into `into`, summing duplicates.
pub fn merge_into(into: &mut Wager, other: &Wager) {
    for (combination, qty) in other {
        let slot = into.entry(combination.clone()).or_insert(0);
        *slot = slot.saturating_add(*qty);
    }
}

/// Parse the comma-separated `prefix-suffix:quantity` form.
///
/// Missing or non-numeric quantities count as 0, duplicate keys accumulate,
/// entries whose key is not a digit string are dropped.
pub fn parse_wager(raw: &str) -> Wager {
    let mut wager = Wager::new();
    let body = strip_quotes(raw.trim());

    for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, qty) = match entry.split_once(':') {
            Some((k, q)) => (k, q.trim()),
            None => (entry, ""),
        };
        let Some(combination) = Combination::parse(key) else {
            debug!("skipping malformed wager entry {:?}", entry);
            continue;
        };
        let quantity = qty.parse::<u64>().unwrap_or(0);
        let slot = wager.entry(combination).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    wager
}

/// Parse either a JSON object (`{"10-05": 2}`) or, when the text is not a
/// JSON object, the CSV form accepted by [`parse_wager`].
pub fn parse_wager_any(raw: &str) -> Wager {
    let trimmed = raw.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            let mut wager = Wager::new();
            for (key, value) in &map {
                let Some(combination) = Combination::parse_lenient(key) else {
                    debug!("skipping malformed wager key {:?}", key);
                    continue;
                };
                let slot = wager.entry(combination).or_insert(0);
                *slot = slot.saturating_add(json_quantity(value));
            }
            wager
        }
        Ok(serde_json::Value::String(inner)) => parse_wager(&inner),
        _ => parse_wager(trimmed),
    }
}

/// Render a wager back into the canonical CSV form (`"1001:4,3002:8"`).
pub fn format_wager(wager: &Wager) -> String {
    wager
        .iter()
        .map(|(c, q)| format!("{c}:{q}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn json_quantity(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(key: &str) -> Combination {
        Combination::parse(key).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let w = parse_wager("10-01:4,30-02:8");
        assert_eq!(w.len(), 2);
        assert_eq!(w[&c("1001")], 4);
        assert_eq!(w[&c("3002")], 8);
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert!(parse_wager("").is_empty());
        assert!(parse_wager("   ").is_empty());
        assert!(parse_wager("hello world").is_empty());
        assert!(parse_wager(",,,:").is_empty());
    }

    #[test]
    fn test_duplicates_accumulate() {
        let w = parse_wager("10-05:2, 10-05 : 3,1005:1");
        assert_eq!(w[&c("1005")], 6);
    }

    #[test]
    fn test_missing_or_bad_quantity_is_zero() {
        let w = parse_wager("10-01,30-02:abc,50-03:-4");
        assert_eq!(w[&c("1001")], 0);
        assert_eq!(w[&c("3002")], 0);
        assert_eq!(w[&c("5003")], 0);
    }

    #[test]
    fn test_quoted_wrapper_ignored() {
        let w = parse_wager("\"30-00 : 3, 30-11 : 4\"");
        assert_eq!(w[&c("3000")], 3);
        assert_eq!(w[&c("3011")], 4);
    }

    #[test]
    fn test_json_and_csv_forms_agree() {
        let csv = parse_wager_any("10-01:4,30-02:8");
        let json = parse_wager_any(r#"{"10-01": 4, "3002": "8"}"#);
        assert_eq!(csv, json);
    }

    #[test]
    fn test_json_non_object_falls_back() {
        assert!(parse_wager_any(r#"["x", "y"]"#).is_empty());
        let w = parse_wager_any(r#""10-05:2""#);
        assert_eq!(w[&c("1005")], 2);
    }

    #[test]
    fn test_series_prefix() {
        assert_eq!(c("10-05").series(), Some("10"));
        assert!(c("3011").in_series("30"));
        assert_eq!(c("7").series(), None);
    }

    #[test]
    fn test_merge_and_total() {
        let mut a = parse_wager("10-01:4");
        merge_into(&mut a, &parse_wager("10-01:1,30-02:8"));
        assert_eq!(a[&c("1001")], 5);
        assert_eq!(total_quantity(&a), 13);
        assert_eq!(format_wager(&a), "1001:5,3002:8");
    }
}
