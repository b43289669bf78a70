//! Ticket issuance.

use rust_decimal::Decimal;
use tracing::info;

use draw_core::wager::total_quantity;
use draw_core::{parse_slot_list, parse_wager_any};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{self, TicketIssued};
use crate::state::account::report;
use crate::state::ticket::{IssuedTicket, NewTicket};
use crate::state::Scope;
use crate::store::tickets::{self, TicketInsert};
use crate::store::{accounts, to_i64, Store};

use super::draw::{canonical_slot, check_scope};

/// Normalize the raw slot entries of a ticket. Each entry may itself be a
/// JSON list; the result is flat, canonical and free of duplicates.
fn ticket_slots(raw: &[String]) -> Result<Vec<String>> {
    let mut slots: Vec<String> = Vec::new();
    for entry in raw {
        for slot in parse_slot_list(entry) {
            let slot = canonical_slot(&slot)?;
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
    }
    if slots.is_empty() {
        return Err(EngineError::validation("a ticket needs at least one slot"));
    }
    Ok(slots)
}

/// Print a ticket: debit the shop net of commission and store the ticket,
/// atomically.
pub async fn handle_issue_ticket(
    store: &Store,
    config: &EngineConfig,
    new: &NewTicket,
) -> Result<IssuedTicket> {
    if new.account_id <= 0 {
        return Err(EngineError::validation(format!(
            "invalid account id {}",
            new.account_id
        )));
    }
    check_scope(new.scope)?;
    if let Scope::Account(owner) = new.scope {
        if owner != new.account_id {
            return Err(EngineError::validation(format!(
                "account {} cannot issue into scope {}",
                new.account_id, new.scope
            )));
        }
    }

    let slots = ticket_slots(&new.slots)?;
    let wager_text = new.wager.trim();
    let wager = parse_wager_any(wager_text);
    let quantity = total_quantity(&wager);
    if quantity == 0 {
        return Err(EngineError::validation("wager has no playable combination"));
    }
    let total_points = quantity
        .checked_mul(config.unit_stake)
        .ok_or_else(|| EngineError::validation("wager too large"))?;
    let total_points = to_i64(total_points, "total points")?;
    let points = Decimal::from(total_points);

    let mut tx = store.begin().await?;
    let account = accounts::get_account(&mut tx, new.account_id, true)
        .await?
        .ok_or(EngineError::NotFound {
            entity: "account",
            id: new.account_id,
        })?;

    let commission_earned = account.commission_on(points);
    let net_debit = account.net_of_commission(points);
    let new_balance = accounts::debit_balance(&mut tx, account.id, net_debit).await?;

    let ticket = tickets::insert_ticket(
        &mut tx,
        &TicketInsert {
            account_id: account.id,
            scope: new.scope,
            draw_date: new.draw_date,
            slots: &slots,
            wager: wager_text,
            total_points,
        },
    )
    .await?;
    tx.commit().await?;

    events::emit(&TicketIssued {
        ticket_id: ticket.id,
        account_id: ticket.account_id,
        scope: ticket.scope,
        draw_date: ticket.draw_date,
        slots: ticket.slots.clone(),
        total_points,
        net_debit: report(net_debit),
    });
    info!(
        ticket = ticket.id,
        account = account.id,
        total_points,
        "ticket issued"
    );

    Ok(IssuedTicket {
        ticket,
        commission_rate: report(account.commission),
        commission_earned: report(commission_earned),
        net_debit: report(net_debit),
        previous_balance: report(account.balance),
        new_balance: report(new_balance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_slots_flatten_and_dedup() {
        let raw = vec![
            r#"["8:45pm", "09:00 PM"]"#.to_string(),
            "08.45 PM".to_string(),
        ];
        assert_eq!(ticket_slots(&raw).unwrap(), vec!["08:45 PM", "09:00 PM"]);
    }

    #[test]
    fn test_ticket_slots_rejects_empty_and_garbage() {
        assert!(ticket_slots(&[]).is_err());
        assert!(ticket_slots(&["  ".to_string()]).is_err());
        assert!(ticket_slots(&["noon-ish".to_string()]).is_err());
    }
}
