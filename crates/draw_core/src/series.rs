//! Series display boards.
//!
//! Every declared result shows each configured series as a fixed-size block.
//! Real winners keep their place at the top of their block; the rest is
//! padded with random, zero-valued combinations that do not collide.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;

use crate::constants::{FILLER_SUFFIX_DIGITS, SUFFIX_SPACE};
use crate::selector::DrawEntry;
use crate::wager::Combination;

/// Series prefix → exactly `capacity` entries.
pub type SeriesBoard = BTreeMap<String, Vec<DrawEntry>>;

/// Build one series block of exactly `capacity` entries.
///
/// Entries of `existing` outside `prefix` are ignored; if more than
/// `capacity` belong to it, the first `capacity` are kept. `capacity` is
/// clamped to the filler key space so generation always terminates.
pub fn fill_series<R: Rng + ?Sized>(
    prefix: &str,
    existing: &[DrawEntry],
    capacity: usize,
    rng: &mut R,
) -> Vec<DrawEntry> {
    let capacity = capacity.min(SUFFIX_SPACE);
    let mut used: HashSet<Combination> = HashSet::with_capacity(capacity);
    let mut block: Vec<DrawEntry> = Vec::with_capacity(capacity);

    for entry in existing.iter().filter(|e| e.combination.in_series(prefix)) {
        if block.len() == capacity {
            break;
        }
        if used.insert(entry.combination.clone()) {
            block.push(entry.clone());
        }
    }

    while block.len() < capacity {
        let suffix = rng.gen_range(0..SUFFIX_SPACE);
        let key = format!("{prefix}{suffix:0width$}", width = FILLER_SUFFIX_DIGITS);
        let Some(combination) = Combination::parse(&key) else {
            // Non-digit prefix: nothing sensible can be generated.
            break;
        };
        if used.insert(combination.clone()) {
            block.push(DrawEntry::filler(combination));
        }
    }

    block
}

/// Build the board for every configured prefix.
pub fn build_board<R: Rng + ?Sized>(
    prefixes: &[String],
    winners: &[DrawEntry],
    capacity: usize,
    rng: &mut R,
) -> SeriesBoard {
    prefixes
        .iter()
        .map(|prefix| (prefix.clone(), fill_series(prefix, winners, capacity, rng)))
        .collect()
}
