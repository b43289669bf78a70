//! Account balances and the payout-rate table.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use crate::error::{EngineError, Result};
use crate::state::account::Account;

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    balance: String,
    commission: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = EngineError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Account {
            id: row.id,
            balance: row.balance.parse()?,
            commission: row.commission.parse()?,
        })
    }
}

pub async fn insert_account(conn: &mut SqliteConnection, account: &Account) -> Result<()> {
    sqlx::query("INSERT INTO accounts (id, balance, commission) VALUES (?1, ?2, ?3)")
        .bind(account.id)
        .bind(account.balance.to_string())
        .bind(account.commission.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Take the write lock on an account row. Returns false if it does not exist.
pub async fn lock_account(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let done = sqlx::query("UPDATE accounts SET balance = balance WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(done.rows_affected() == 1)
}

pub async fn get_account(
    conn: &mut SqliteConnection,
    id: i64,
    for_update: bool,
) -> Result<Option<Account>> {
    if for_update && !lock_account(conn, id).await? {
        return Ok(None);
    }
    let row: Option<AccountRow> =
        sqlx::query_as("SELECT id, balance, commission FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Account::try_from).transpose()
}

async fn store_balance(conn: &mut SqliteConnection, id: i64, balance: Decimal) -> Result<()> {
    sqlx::query("UPDATE accounts SET balance = ?1 WHERE id = ?2")
        .bind(balance.to_string())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Add `amount` to the balance. Caller holds the row lock. Returns the new
/// balance.
pub async fn credit_balance(
    conn: &mut SqliteConnection,
    id: i64,
    amount: Decimal,
) -> Result<Decimal> {
    let account = get_account(conn, id, false)
        .await?
        .ok_or(EngineError::NotFound {
            entity: "account",
            id,
        })?;
    let balance = account.balance + amount;
    store_balance(conn, id, balance).await?;
    Ok(balance)
}

/// Subtract `amount`, refusing to go below zero. Caller holds the row lock.
pub async fn debit_balance(
    conn: &mut SqliteConnection,
    id: i64,
    amount: Decimal,
) -> Result<Decimal> {
    let account = get_account(conn, id, false)
        .await?
        .ok_or(EngineError::NotFound {
            entity: "account",
            id,
        })?;
    if account.balance < amount {
        return Err(EngineError::InsufficientBalance {
            available: account.balance,
            required: amount,
        });
    }
    let balance = account.balance - amount;
    store_balance(conn, id, balance).await?;
    Ok(balance)
}

// ── Payout rate ─────────────────────────────────────────────────

/// Latest configured payout percentage, or zero when none was ever set.
pub async fn current_payout_rate(conn: &mut SqliteConnection) -> Result<Decimal> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT percentage FROM payout_rates ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;
    match row {
        Some((percentage,)) => Ok(percentage.parse()?),
        None => Ok(Decimal::ZERO),
    }
}

pub async fn insert_payout_rate(conn: &mut SqliteConnection, percentage: Decimal) -> Result<()> {
    sqlx::query("INSERT INTO payout_rates (percentage, effective_at) VALUES (?1, ?2)")
        .bind(percentage.to_string())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[tokio::test]
    async fn test_credit_and_debit() {
        let store = Store::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        insert_account(
            &mut tx,
            &Account {
                id: 1,
                balance: Decimal::from(100),
                commission: Decimal::from(10),
            },
        )
        .await
        .unwrap();

        assert!(lock_account(&mut tx, 1).await.unwrap());
        assert!(!lock_account(&mut tx, 2).await.unwrap());

        let after = credit_balance(&mut tx, 1, Decimal::new(505, 1)).await.unwrap();
        assert_eq!(after, Decimal::new(1505, 1));

        let err = debit_balance(&mut tx, 1, Decimal::from(1000)).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance { .. }));

        let after = debit_balance(&mut tx, 1, Decimal::from(150)).await.unwrap();
        assert_eq!(after, Decimal::new(5, 1));
        tx.commit().await.unwrap();

        let account = store.get_account(1).await.unwrap().unwrap();
        assert_eq!(account.balance, Decimal::new(5, 1));
    }

    #[tokio::test]
    async fn test_payout_rate_latest_wins() {
        let store = Store::in_memory().await.unwrap();
        assert_eq!(store.current_payout_rate().await.unwrap(), Decimal::ZERO);
        store.set_payout_rate(Decimal::from(40)).await.unwrap();
        store.set_payout_rate(Decimal::new(625, 1)).await.unwrap();
        assert_eq!(
            store.current_payout_rate().await.unwrap(),
            Decimal::new(625, 1)
        );
    }
}
