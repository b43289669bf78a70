//! Ticket rows.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::error::{EngineError, Result};
use crate::state::ticket::Ticket;
use crate::state::Scope;

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    account_id: i64,
    scope_key: String,
    draw_date: NaiveDate,
    slots: String,
    wager: String,
    total_points: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = EngineError;

    fn try_from(row: TicketRow) -> Result<Self> {
        let scope = Scope::from_key(&row.scope_key)
            .ok_or_else(|| EngineError::Corrupt(format!("ticket {} scope {}", row.id, row.scope_key)))?;
        Ok(Ticket {
            id: row.id,
            account_id: row.account_id,
            scope,
            draw_date: row.draw_date,
            slots: serde_json::from_str(&row.slots)?,
            wager: row.wager,
            total_points: row.total_points,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str =
    "id, account_id, scope_key, draw_date, slots, wager, total_points, created_at";

/// Ticket fields as validated by issuance. `slots` are already normalized.
#[derive(Debug)]
pub struct TicketInsert<'a> {
    pub account_id: i64,
    pub scope: Scope,
    pub draw_date: NaiveDate,
    pub slots: &'a [String],
    pub wager: &'a str,
    pub total_points: i64,
}

pub async fn insert_ticket(conn: &mut SqliteConnection, new: &TicketInsert<'_>) -> Result<Ticket> {
    let created_at = Utc::now();
    let done = sqlx::query(
        "INSERT INTO tickets (account_id, scope_key, draw_date, slots, wager, total_points, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(new.account_id)
    .bind(new.scope.key())
    .bind(new.draw_date)
    .bind(serde_json::to_string(new.slots)?)
    .bind(new.wager)
    .bind(new.total_points)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    let id = done.last_insert_rowid();
    get_ticket(conn, id)
        .await?
        .ok_or_else(|| EngineError::Consistency(format!("ticket {id} vanished after insert")))
}

pub async fn get_ticket(conn: &mut SqliteConnection, id: i64) -> Result<Option<Ticket>> {
    let row: Option<TicketRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM tickets WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Ticket::try_from).transpose()
}

/// Take the write lock on a ticket row. Returns false if it does not exist.
pub async fn lock_ticket(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let done = sqlx::query("UPDATE tickets SET total_points = total_points WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(done.rows_affected() == 1)
}

/// Tickets of `scope` for `draw_date` whose slot list contains `slot`.
pub async fn list_tickets_for_slot(
    conn: &mut SqliteConnection,
    draw_date: NaiveDate,
    slot: &str,
    scope: Scope,
) -> Result<Vec<Ticket>> {
    let rows: Vec<TicketRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM tickets
         WHERE draw_date = ?1 AND scope_key = ?2
           AND EXISTS (SELECT 1 FROM json_each(tickets.slots) WHERE json_each.value = ?3)
         ORDER BY id"
    ))
    .bind(draw_date)
    .bind(scope.key())
    .bind(slot)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Ticket::try_from).collect()
}
