//! Declared results. Insert-if-absent keyed by (scope, slot, draw date).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::state::draw::{Declaration, DrawResult, NewDrawResult};
use crate::state::Scope;

use super::{is_unique_violation, to_i64, to_u64};

#[derive(Debug, sqlx::FromRow)]
struct DrawRow {
    id: i64,
    scope_key: String,
    slot: String,
    draw_date: NaiveDate,
    total_points: i64,
    unit_payout: i64,
    winners: String,
    series: String,
    digest: String,
    declared_at: DateTime<Utc>,
}

impl TryFrom<DrawRow> for DrawResult {
    type Error = EngineError;

    fn try_from(row: DrawRow) -> Result<Self> {
        let scope = Scope::from_key(&row.scope_key).ok_or_else(|| {
            EngineError::Corrupt(format!("draw result {} scope {}", row.id, row.scope_key))
        })?;
        Ok(DrawResult {
            id: row.id,
            scope,
            slot: row.slot,
            draw_date: row.draw_date,
            total_points: row.total_points,
            unit_payout: to_u64(row.unit_payout, "unit_payout")?,
            winners: serde_json::from_str(&row.winners)?,
            series: serde_json::from_str(&row.series)?,
            digest: row.digest,
            declared_at: row.declared_at,
        })
    }
}

const COLUMNS: &str = "id, scope_key, slot, draw_date, total_points, unit_payout, \
                       winners, series, digest, declared_at";

/// Atomically declare `new` unless the key is taken.
///
/// Concurrent callers for one key: exactly one gets `Created`, the rest get
/// `AlreadyExists` with the stored row.
pub async fn declare(conn: &mut SqliteConnection, new: &NewDrawResult) -> Result<Declaration> {
    let inserted = sqlx::query(
        "INSERT INTO draw_results
            (scope_key, slot, draw_date, total_points, unit_payout, winners, series, digest, declared_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (scope_key, slot, draw_date) DO NOTHING",
    )
    .bind(new.scope.key())
    .bind(&new.slot)
    .bind(new.draw_date)
    .bind(new.total_points)
    .bind(to_i64(new.unit_payout, "unit_payout")?)
    .bind(serde_json::to_string(&new.winners)?)
    .bind(serde_json::to_string(&new.series)?)
    .bind(new.digest())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await;

    let created = match inserted {
        Ok(done) => done.rows_affected() == 1,
        Err(e) if is_unique_violation(&e) => false,
        Err(e) => return Err(e.into()),
    };
    if !created {
        debug!(scope = %new.scope, slot = %new.slot, date = %new.draw_date, "declaration exists");
    }

    let stored = lookup(conn, new.scope, &new.slot, new.draw_date)
        .await?
        .ok_or_else(|| {
            EngineError::Consistency(format!(
                "declaration {} {} {} missing after insert",
                new.scope, new.slot, new.draw_date
            ))
        })?;

    Ok(if created {
        Declaration::Created(stored)
    } else {
        Declaration::AlreadyExists(stored)
    })
}

pub async fn lookup(
    conn: &mut SqliteConnection,
    scope: Scope,
    slot: &str,
    draw_date: NaiveDate,
) -> Result<Option<DrawResult>> {
    let row: Option<DrawRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM draw_results
         WHERE scope_key = ?1 AND slot = ?2 AND draw_date = ?3"
    ))
    .bind(scope.key())
    .bind(slot)
    .bind(draw_date)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(DrawResult::try_from).transpose()
}

/// Every declaration on `draw_date`, any scope, in declaration order.
pub async fn list_for_date(
    conn: &mut SqliteConnection,
    draw_date: NaiveDate,
) -> Result<Vec<DrawResult>> {
    let rows: Vec<DrawRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM draw_results WHERE draw_date = ?1 ORDER BY id"
    ))
    .bind(draw_date)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(DrawResult::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use draw_core::{Combination, DrawEntry, SeriesBoard};

    fn new_result(points: i64) -> NewDrawResult {
        NewDrawResult {
            scope: Scope::Global,
            slot: "08:45 PM".into(),
            draw_date: NaiveDate::from_ymd_opt(2025, 7, 27).unwrap(),
            total_points: points,
            unit_payout: 180,
            winners: vec![DrawEntry::winner(Combination::parse("1005").unwrap(), 2, 180)],
            series: SeriesBoard::new(),
        }
    }

    #[tokio::test]
    async fn test_second_declare_returns_first() {
        let store = Store::in_memory().await.unwrap();

        let first = store.declare(&new_result(360)).await.unwrap();
        assert!(first.is_created());

        let second = store.declare(&new_result(999)).await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.result(), first.result());
        assert_eq!(second.result().total_points, 360);
        assert_eq!(first.result().digest, new_result(360).digest());
    }

    #[tokio::test]
    async fn test_scopes_are_separate_keys() {
        let store = Store::in_memory().await.unwrap();
        store.declare(&new_result(360)).await.unwrap();

        let mut shop = new_result(180);
        shop.scope = Scope::Account(4);
        assert!(store.declare(&shop).await.unwrap().is_created());

        let day = NaiveDate::from_ymd_opt(2025, 7, 27).unwrap();
        let all = store.results_on(day).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].scope, Scope::Account(4));

        let missing = store
            .lookup(Scope::Account(5), "08:45 PM", day)
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
