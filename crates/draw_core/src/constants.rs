//! Fixed parameters of the numbers draw.
//!
//! Runtime-tunable values (unit payout, series list, capacity) live in the
//! engine config; these are the defaults and the hard limits behind them.

/// Points paid per winning quantity unit.
pub const DEFAULT_UNIT_PAYOUT: u64 = 180;

/// Points charged per wagered quantity unit.
pub const DEFAULT_UNIT_STAKE: u64 = 180;

/// Series displayed on every declared result.
pub const DEFAULT_SERIES_PREFIXES: &[&str] = &["10", "30", "50"];

/// Entries shown per series block.
pub const DEFAULT_SERIES_CAPACITY: usize = 10;

/// Leading digits that identify a combination's series.
pub const SERIES_PREFIX_LEN: usize = 2;

/// Digits appended to a prefix when generating filler combinations.
pub const FILLER_SUFFIX_DIGITS: usize = 2;

/// Distinct filler keys available per series (`00`..=`99`).
/// Series capacity can never exceed this or filling would not terminate.
pub const SUFFIX_SPACE: usize = 100;
