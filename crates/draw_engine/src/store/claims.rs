//! Claim rows. `ticket_id` is unique: one claim per ticket, ever.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::error::{EngineError, Result};
use crate::state::claim::{Claim, ClaimMatch};

use super::is_unique_violation;

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: i64,
    ticket_id: i64,
    account_id: i64,
    draw_date: NaiveDate,
    slots: String,
    matches: String,
    total_payout: i64,
    claimed_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = EngineError;

    fn try_from(row: ClaimRow) -> Result<Self> {
        Ok(Claim {
            id: row.id,
            ticket_id: row.ticket_id,
            account_id: row.account_id,
            draw_date: row.draw_date,
            slots: serde_json::from_str(&row.slots)?,
            matches: serde_json::from_str(&row.matches)?,
            total_payout: row.total_payout,
            claimed_at: row.claimed_at,
        })
    }
}

const COLUMNS: &str =
    "id, ticket_id, account_id, draw_date, slots, matches, total_payout, claimed_at";

#[derive(Debug)]
pub struct ClaimInsert<'a> {
    pub ticket_id: i64,
    pub account_id: i64,
    pub draw_date: NaiveDate,
    pub slots: &'a [String],
    pub matches: &'a [ClaimMatch],
    pub total_payout: i64,
}

pub async fn find_by_ticket(conn: &mut SqliteConnection, ticket_id: i64) -> Result<Option<Claim>> {
    let row: Option<ClaimRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM claims WHERE ticket_id = ?1"))
            .bind(ticket_id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Claim::try_from).transpose()
}

/// Insert a claim. `Ok(None)` when the ticket already has one.
pub async fn insert_claim(
    conn: &mut SqliteConnection,
    new: &ClaimInsert<'_>,
) -> Result<Option<Claim>> {
    let claimed_at = Utc::now();
    let inserted = sqlx::query(
        "INSERT INTO claims
            (ticket_id, account_id, draw_date, slots, matches, total_payout, claimed_at, claimed_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(new.ticket_id)
    .bind(new.account_id)
    .bind(new.draw_date)
    .bind(serde_json::to_string(new.slots)?)
    .bind(serde_json::to_string(new.matches)?)
    .bind(new.total_payout)
    .bind(claimed_at)
    .bind(claimed_at.date_naive())
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => find_by_ticket(conn, new.ticket_id).await,
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Claims settled on any day in `from..=to` (UTC), oldest first.
pub async fn list_between(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Claim>> {
    let rows: Vec<ClaimRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM claims WHERE claimed_on BETWEEN ?1 AND ?2 ORDER BY id"
    ))
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Claim::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn insert(ticket_id: i64) -> ClaimInsert<'static> {
        ClaimInsert {
            ticket_id,
            account_id: 1,
            draw_date: NaiveDate::from_ymd_opt(2025, 7, 27).unwrap(),
            slots: &[],
            matches: &[],
            total_payout: 360,
        }
    }

    #[tokio::test]
    async fn test_second_insert_is_rejected() {
        let store = Store::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        let first = insert_claim(&mut tx, &insert(7)).await.unwrap();
        assert!(first.is_some());
        let second = insert_claim(&mut tx, &insert(7)).await.unwrap();
        assert!(second.is_none());
        tx.commit().await.unwrap();

        let stored = store.claim_for_ticket(7).await.unwrap().unwrap();
        assert_eq!(stored.total_payout, 360);
    }

    #[tokio::test]
    async fn test_claims_between() {
        let store = Store::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        insert_claim(&mut tx, &insert(1)).await.unwrap();
        insert_claim(&mut tx, &insert(2)).await.unwrap();
        tx.commit().await.unwrap();

        let today = Utc::now().date_naive();
        let found = store.claims_between(today, today).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].ticket_id, 1);

        let yesterday = today.pred_opt().unwrap();
        assert!(store
            .claims_between(yesterday, yesterday)
            .await
            .unwrap()
            .is_empty());
    }
}
