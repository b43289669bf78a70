//! Declared draw results.

use std::collections::BTreeSet;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use draw_core::{Combination, DrawEntry, SeriesBoard};

use super::Scope;

/// Domain separator for result digests.
const RESULT_DIGEST_DOMAIN: &[u8] = b"DRAWv1";

/// An immutable declaration for one (scope, slot, date).
///
/// **Invariant**: at most one exists per key; it is never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub id: i64,
    pub scope: Scope,

    /// Normalized slot (`HH:MM AM|PM`).
    pub slot: String,

    pub draw_date: NaiveDate,

    /// Points wagered by every ticket aggregated into this draw.
    pub total_points: i64,

    /// Points per winning quantity unit at declaration time. Claims are
    /// paid with this value, never with the current config.
    pub unit_payout: u64,

    /// Winning combinations in admission order.
    pub winners: Vec<DrawEntry>,

    /// Display blocks per series, padded with fillers.
    pub series: SeriesBoard,

    /// Base64 SHA-256 over the declared content.
    pub digest: String,

    pub declared_at: DateTime<Utc>,
}

impl DrawResult {
    pub fn is_winning(&self, combination: &Combination) -> bool {
        self.winners.iter().any(|w| &w.combination == combination)
    }

    pub fn winning_keys(&self) -> BTreeSet<Combination> {
        self.winners.iter().map(|w| w.combination.clone()).collect()
    }

    /// Sum of winner payout values.
    pub fn declared_payout(&self) -> u64 {
        draw_core::total_value(&self.winners)
    }
}

/// A result about to be declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrawResult {
    pub scope: Scope,
    pub slot: String,
    pub draw_date: NaiveDate,
    pub total_points: i64,
    pub unit_payout: u64,
    pub winners: Vec<DrawEntry>,
    pub series: SeriesBoard,
}

impl NewDrawResult {
    /// Content digest. Identical content always hashes identically, so two
    /// reads of the same declaration can be compared by digest alone.
    pub fn digest(&self) -> String {
        let mut h = Sha256::new();
        h.update(RESULT_DIGEST_DOMAIN);
        // Serializing these plain structs cannot fail.
        h.update(serde_json::to_vec(self).unwrap_or_default());
        BASE64.encode(h.finalize())
    }
}

/// Result of `Store::declare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Created(DrawResult),
    /// The key was already declared; nothing was written.
    AlreadyExists(DrawResult),
}

impl Declaration {
    pub fn result(&self) -> &DrawResult {
        match self {
            Self::Created(r) | Self::AlreadyExists(r) => r,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of triggering a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DrawOutcome {
    /// Winners selected from the slot's tickets and declared.
    Declared { result: DrawResult },
    /// A declaration already existed (or a concurrent trigger won the race).
    AlreadyDeclared { result: DrawResult },
    /// No tickets for the slot; an all-zero filler result was declared.
    NoTicketsRandomFill { result: DrawResult },
    /// No tickets for the slot and the policy withholds empty declarations.
    Withheld { slot: String, draw_date: NaiveDate },
}

impl DrawOutcome {
    pub fn result(&self) -> Option<&DrawResult> {
        match self {
            Self::Declared { result }
            | Self::AlreadyDeclared { result }
            | Self::NoTicketsRandomFill { result } => Some(result),
            Self::Withheld { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Declared { .. } => "declared",
            Self::AlreadyDeclared { .. } => "already_declared",
            Self::NoTicketsRandomFill { .. } => "no_tickets_random_fill",
            Self::Withheld { .. } => "withheld",
        }
    }
}
