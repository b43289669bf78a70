//! Claim settlement and the read-only ticket check.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use draw_core::Combination;

use crate::error::{EngineError, Result};
use crate::events::{self, ClaimSettled};
use crate::state::account::report;
use crate::state::claim::{ClaimMatch, ClaimOutcome, TicketStatus};
use crate::state::ticket::Ticket;
use crate::store::claims::{self, ClaimInsert};
use crate::store::{accounts, draws, tickets, to_i64, Store};

/// How a ticket stands against the declared results of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Evaluation {
    NoDeclaration(Vec<String>),
    NoMatch(Vec<Combination>),
    Winning {
        matches: Vec<ClaimMatch>,
        total_payout: i64,
    },
}

/// Match a ticket against the results declared for every one of its slots.
///
/// Winning keys are unioned across slots, so a combination is paid once,
/// at the unit payout of the first slot (ticket order) that declared it.
pub(crate) async fn evaluate(conn: &mut SqliteConnection, ticket: &Ticket) -> Result<Evaluation> {
    let mut missing = Vec::new();
    let mut results = Vec::with_capacity(ticket.slots.len());
    for slot in &ticket.slots {
        match draws::lookup(conn, ticket.scope, slot, ticket.draw_date).await? {
            Some(result) => results.push(result),
            None => missing.push(slot.clone()),
        }
    }
    if !missing.is_empty() {
        return Ok(Evaluation::NoDeclaration(missing));
    }

    let mut winning: BTreeMap<Combination, (&str, u64)> = BTreeMap::new();
    for result in &results {
        for entry in &result.winners {
            winning
                .entry(entry.combination.clone())
                .or_insert((result.slot.as_str(), result.unit_payout));
        }
    }

    let mut matches = Vec::new();
    let mut total: u64 = 0;
    for (combination, quantity) in ticket.parsed_wager() {
        if quantity == 0 {
            continue;
        }
        let Some((slot, unit_payout)) = winning.get(&combination) else {
            continue;
        };
        let payout = quantity.checked_mul(*unit_payout).ok_or_else(|| {
            EngineError::Consistency(format!("payout overflow on ticket {}", ticket.id))
        })?;
        total = total.checked_add(payout).ok_or_else(|| {
            EngineError::Consistency(format!("payout overflow on ticket {}", ticket.id))
        })?;
        matches.push(ClaimMatch {
            combination,
            slot: slot.to_string(),
            quantity,
            unit_payout: *unit_payout,
            payout,
        });
    }

    if matches.is_empty() {
        return Ok(Evaluation::NoMatch(winning.into_keys().collect()));
    }
    Ok(Evaluation::Winning {
        matches,
        total_payout: to_i64(total, "total payout")?,
    })
}

/// Claim a ticket's winnings exactly once.
///
/// Runs in one transaction: the ticket row is locked first so concurrent
/// claims on the same ticket serialize, then the claim row is inserted and
/// the owner credited. Any error rolls everything back.
pub async fn handle_submit_claim(store: &Store, ticket_id: i64) -> Result<ClaimOutcome> {
    if ticket_id <= 0 {
        return Err(EngineError::validation(format!("invalid ticket id {ticket_id}")));
    }

    let mut tx = store.begin().await?;
    if !tickets::lock_ticket(&mut tx, ticket_id).await? {
        tx.rollback().await?;
        return Ok(ClaimOutcome::NotFound { ticket_id });
    }

    if let Some(claim) = claims::find_by_ticket(&mut tx, ticket_id).await? {
        tx.rollback().await?;
        debug!(ticket = ticket_id, "already claimed");
        return Ok(ClaimOutcome::AlreadyClaimed { claim });
    }

    let Some(ticket) = tickets::get_ticket(&mut tx, ticket_id).await? else {
        tx.rollback().await?;
        return Ok(ClaimOutcome::NotFound { ticket_id });
    };

    let (matches, total_payout) = match evaluate(&mut tx, &ticket).await? {
        Evaluation::NoDeclaration(missing_slots) => {
            tx.rollback().await?;
            debug!(ticket = ticket_id, ?missing_slots, "claim before declaration");
            return Ok(ClaimOutcome::NoDeclaration { missing_slots });
        }
        Evaluation::NoMatch(winning) => {
            tx.rollback().await?;
            return Ok(ClaimOutcome::NoMatch { winning });
        }
        Evaluation::Winning {
            matches,
            total_payout,
        } => (matches, total_payout),
    };

    let inserted = claims::insert_claim(
        &mut tx,
        &ClaimInsert {
            ticket_id,
            account_id: ticket.account_id,
            draw_date: ticket.draw_date,
            slots: &ticket.slots,
            matches: &matches,
            total_payout,
        },
    )
    .await?;
    let Some(claim) = inserted else {
        tx.rollback().await?;
        warn!(ticket = ticket_id, "claim insert hit an existing claim");
        return match store.claim_for_ticket(ticket_id).await? {
            Some(claim) => Ok(ClaimOutcome::AlreadyClaimed { claim }),
            None => Err(EngineError::Consistency(format!(
                "claim for ticket {ticket_id} conflicted but is missing"
            ))),
        };
    };

    if !accounts::lock_account(&mut tx, ticket.account_id).await? {
        tx.rollback().await?;
        return Err(EngineError::NotFound {
            entity: "account",
            id: ticket.account_id,
        });
    }
    let balance =
        accounts::credit_balance(&mut tx, ticket.account_id, Decimal::from(total_payout)).await?;
    tx.commit().await?;

    events::emit(&ClaimSettled {
        claim_id: claim.id,
        ticket_id,
        account_id: claim.account_id,
        total_payout,
        balance: report(balance),
    });
    info!(
        ticket = ticket_id,
        account = claim.account_id,
        total_payout,
        "claim settled"
    );

    Ok(ClaimOutcome::Claimed {
        claim,
        balance: report(balance),
    })
}

/// Preview a claim without writing anything.
pub async fn handle_check_ticket(store: &Store, ticket_id: i64) -> Result<TicketStatus> {
    if ticket_id <= 0 {
        return Err(EngineError::validation(format!("invalid ticket id {ticket_id}")));
    }

    let mut conn = store.acquire().await?;
    if let Some(claim) = claims::find_by_ticket(&mut conn, ticket_id).await? {
        return Ok(TicketStatus::AlreadyClaimed { claim });
    }
    let Some(ticket) = tickets::get_ticket(&mut conn, ticket_id).await? else {
        return Ok(TicketStatus::NotFound { ticket_id });
    };

    Ok(match evaluate(&mut conn, &ticket).await? {
        Evaluation::NoDeclaration(missing_slots) => TicketStatus::NoDeclaration { missing_slots },
        Evaluation::NoMatch(winning) => TicketStatus::NoMatch { winning },
        Evaluation::Winning {
            matches,
            total_payout,
        } => TicketStatus::Winning {
            matches,
            total_payout,
        },
    })
}
