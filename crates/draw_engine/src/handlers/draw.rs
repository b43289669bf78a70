//! Draw trigger: aggregate a slot's tickets, pick winners within the payout
//! budget, pad the series boards and declare the result once.

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use draw_core::wager::merge_into;
use draw_core::{build_board, normalize_slot, select_winners, time_of_day, Wager};

use crate::config::{EmptySlotPolicy, EngineConfig};
use crate::error::{EngineError, Result};
use crate::events::{self, DrawDeclared};
use crate::state::draw::{Declaration, DrawOutcome, DrawResult, NewDrawResult};
use crate::state::Scope;
use crate::store::Store;

/// Points available to pay winners.
///
/// `rate` is the winning percentage. Account-scoped draws budget from the
/// points the shop actually paid, i.e. net of its `commission` percentage.
pub fn payout_budget(total_points: i64, rate: Decimal, commission: Option<Decimal>) -> u64 {
    let mut base = Decimal::from(total_points);
    if let Some(c) = commission {
        base = base * (Decimal::ONE - c / Decimal::ONE_HUNDRED);
    }
    (base * rate / Decimal::ONE_HUNDRED)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Validate and canonicalize a slot for draw or issuance.
pub(crate) fn canonical_slot(raw: &str) -> Result<String> {
    let slot = normalize_slot(raw);
    if slot.is_empty() {
        return Err(EngineError::validation("slot is required"));
    }
    if time_of_day(&slot).is_none() {
        return Err(EngineError::validation(format!("unrecognized slot {raw:?}")));
    }
    Ok(slot)
}

pub(crate) fn check_scope(scope: Scope) -> Result<()> {
    match scope {
        Scope::Account(id) if id <= 0 => {
            Err(EngineError::validation(format!("invalid account scope {id}")))
        }
        _ => Ok(()),
    }
}

/// Resolve the draw for (scope, slot, date).
///
/// Safe to call repeatedly and concurrently: whoever declares first wins,
/// every other call reports `AlreadyDeclared` with the stored result.
pub async fn handle_trigger_draw<R: Rng + ?Sized>(
    store: &Store,
    config: &EngineConfig,
    scope: Scope,
    raw_slot: &str,
    draw_date: NaiveDate,
    rng: &mut R,
) -> Result<DrawOutcome> {
    check_scope(scope)?;
    let slot = canonical_slot(raw_slot)?;

    if let Some(result) = store.lookup(scope, &slot, draw_date).await? {
        debug!(%scope, %slot, %draw_date, "already declared");
        return Ok(DrawOutcome::AlreadyDeclared { result });
    }

    // Account draws need the owner, even for an empty slot.
    let commission = match scope {
        Scope::Global => None,
        Scope::Account(id) => {
            let account = store
                .get_account(id)
                .await?
                .ok_or(EngineError::NotFound {
                    entity: "account",
                    id,
                })?;
            Some(account.commission)
        }
    };

    let tickets = store.tickets_for_slot(draw_date, &slot, scope).await?;

    if tickets.is_empty() {
        return match config.empty_slot_policy {
            EmptySlotPolicy::Withhold => {
                info!(%scope, %slot, %draw_date, "no tickets, declaration withheld");
                Ok(DrawOutcome::Withheld { slot, draw_date })
            }
            EmptySlotPolicy::RandomFill => {
                let new = NewDrawResult {
                    scope,
                    slot,
                    draw_date,
                    total_points: 0,
                    unit_payout: config.unit_payout,
                    winners: Vec::new(),
                    series: build_board(
                        &config.series_prefixes,
                        &[],
                        config.series_capacity,
                        rng,
                    ),
                };
                match store.declare(&new).await? {
                    Declaration::Created(result) => {
                        announce(&result);
                        info!(%scope, slot = %result.slot, %draw_date, "no tickets, random fill declared");
                        Ok(DrawOutcome::NoTicketsRandomFill { result })
                    }
                    Declaration::AlreadyExists(result) => Ok(DrawOutcome::AlreadyDeclared { result }),
                }
            }
        };
    }

    let mut totals = Wager::new();
    let mut total_points: i64 = 0;
    for ticket in &tickets {
        let wager = ticket.parsed_wager();
        if wager.is_empty() {
            warn!(ticket = ticket.id, "ticket wager did not parse, skipped");
        }
        merge_into(&mut totals, &wager);
        total_points = total_points.saturating_add(ticket.total_points);
    }
    totals.retain(|_, qty| *qty > 0);

    let rate = store.current_payout_rate().await?;
    let budget = payout_budget(total_points, rate, commission);
    let winners = select_winners(&totals, budget, config.unit_payout);
    let series = build_board(
        &config.series_prefixes,
        &winners,
        config.series_capacity,
        rng,
    );

    debug!(
        %scope, %slot, %draw_date,
        tickets = tickets.len(),
        total_points, %rate, budget,
        winners = winners.len(),
        "winners selected"
    );

    let new = NewDrawResult {
        scope,
        slot,
        draw_date,
        total_points,
        unit_payout: config.unit_payout,
        winners,
        series,
    };

    match store.declare(&new).await? {
        Declaration::Created(result) => {
            announce(&result);
            info!(
                %scope,
                slot = %result.slot,
                %draw_date,
                total_points = result.total_points,
                payout = result.declared_payout(),
                "draw declared"
            );
            Ok(DrawOutcome::Declared { result })
        }
        Declaration::AlreadyExists(result) => {
            info!(%scope, slot = %result.slot, %draw_date, "lost declaration race");
            Ok(DrawOutcome::AlreadyDeclared { result })
        }
    }
}

fn announce(result: &DrawResult) {
    events::emit(&DrawDeclared {
        result_id: result.id,
        scope: result.scope,
        slot: result.slot.clone(),
        draw_date: result.draw_date,
        total_points: result.total_points,
        declared_payout: result.declared_payout(),
        winner_count: result.winners.len(),
        digest: result.digest.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_budget() {
        // 360 points at 50% → 180.
        assert_eq!(payout_budget(360, Decimal::from(50), None), 180);
        // Floors.
        assert_eq!(payout_budget(359, Decimal::from(50), None), 179);
        assert_eq!(payout_budget(1000, Decimal::ZERO, None), 0);
    }

    #[test]
    fn test_account_budget_is_net_of_commission() {
        // 1000 × 0.9 × 0.5
        assert_eq!(
            payout_budget(1000, Decimal::from(50), Some(Decimal::from(10))),
            450
        );
        // 1000 × 0.875 × 33.3% = 291.375
        assert_eq!(
            payout_budget(1000, Decimal::new(333, 1), Some(Decimal::new(125, 1))),
            291
        );
    }

    #[test]
    fn test_negative_budget_is_zero() {
        assert_eq!(payout_budget(-10, Decimal::from(50), None), 0);
    }

    #[test]
    fn test_canonical_slot() {
        assert_eq!(canonical_slot("8:45pm").unwrap(), "08:45 PM");
        assert!(canonical_slot("  ").is_err());
        assert!(canonical_slot("lunch").is_err());
    }
}
