//! Engine configuration.

use serde::{Deserialize, Serialize};

use draw_core::constants::{
    DEFAULT_SERIES_CAPACITY, DEFAULT_SERIES_PREFIXES, DEFAULT_UNIT_PAYOUT, DEFAULT_UNIT_STAKE,
    SERIES_PREFIX_LEN, SUFFIX_SPACE,
};

use crate::error::{EngineError, Result};

/// What a draw does when no tickets reference the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySlotPolicy {
    /// Declare an all-zero result with random filler series.
    RandomFill,
    /// Declare nothing; a later trigger may still declare once tickets exist.
    Withhold,
}

impl Default for EmptySlotPolicy {
    fn default() -> Self {
        Self::RandomFill
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Points paid per winning quantity unit.
    pub unit_payout: u64,
    /// Points charged per wagered quantity unit.
    pub unit_stake: u64,
    /// Two-digit series shown on every declared result.
    pub series_prefixes: Vec<String>,
    /// Entries per series block.
    pub series_capacity: usize,
    pub empty_slot_policy: EmptySlotPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_payout: DEFAULT_UNIT_PAYOUT,
            unit_stake: DEFAULT_UNIT_STAKE,
            series_prefixes: DEFAULT_SERIES_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            series_capacity: DEFAULT_SERIES_CAPACITY,
            empty_slot_policy: EmptySlotPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.unit_payout == 0 {
            return Err(EngineError::validation("unit_payout must be > 0"));
        }
        if self.unit_stake == 0 {
            return Err(EngineError::validation("unit_stake must be > 0"));
        }
        if self.series_capacity == 0 || self.series_capacity > SUFFIX_SPACE {
            return Err(EngineError::validation(format!(
                "series_capacity must be within 1..={SUFFIX_SPACE}"
            )));
        }
        for prefix in &self.series_prefixes {
            if prefix.len() != SERIES_PREFIX_LEN || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(EngineError::validation(format!(
                    "series prefix {prefix:?} must be {SERIES_PREFIX_LEN} digits"
                )));
            }
        }
        Ok(())
    }
}
