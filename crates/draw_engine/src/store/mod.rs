//! Relational store (SQLite via sqlx).
//!
//! Free functions in the submodules take a `&mut SqliteConnection` so they
//! run unchanged on a pooled connection or inside a transaction. [`Store`]
//! wraps the pool and exposes the read paths and the draw declaration.
//!
//! Row locks: SQLite has none. `lock_*` helpers issue a no-op `UPDATE` on the
//! row, which makes the transaction a writer from that point on; any other
//! writer waits (busy timeout) until commit or rollback. On a server
//! database the same helpers map onto `SELECT ... FOR UPDATE`.

pub mod accounts;
pub mod claims;
pub mod draws;
pub mod tickets;

use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, Transaction};
use tracing::info;

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::state::account::Account;
use crate::state::claim::Claim;
use crate::state::draw::{Declaration, DrawResult, NewDrawResult};
use crate::state::ticket::Ticket;
use crate::state::Scope;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id          INTEGER PRIMARY KEY,
        balance     TEXT    NOT NULL,
        commission  TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS payout_rates (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        percentage    TEXT    NOT NULL,
        effective_at  TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tickets (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id    INTEGER NOT NULL,
        scope_key     TEXT    NOT NULL,
        draw_date     TEXT    NOT NULL,
        slots         TEXT    NOT NULL,
        wager         TEXT    NOT NULL,
        total_points  INTEGER NOT NULL,
        created_at    TEXT    NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS tickets_by_day ON tickets (draw_date, scope_key)",
    "CREATE TABLE IF NOT EXISTS draw_results (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        scope_key     TEXT    NOT NULL,
        slot          TEXT    NOT NULL,
        draw_date     TEXT    NOT NULL,
        total_points  INTEGER NOT NULL,
        unit_payout   INTEGER NOT NULL,
        winners       TEXT    NOT NULL,
        series        TEXT    NOT NULL,
        digest        TEXT    NOT NULL,
        declared_at   TEXT    NOT NULL,
        UNIQUE (scope_key, slot, draw_date)
    )",
    "CREATE TABLE IF NOT EXISTS claims (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        ticket_id     INTEGER NOT NULL UNIQUE,
        account_id    INTEGER NOT NULL,
        draw_date     TEXT    NOT NULL,
        slots         TEXT    NOT NULL,
        matches       TEXT    NOT NULL,
        total_payout  INTEGER NOT NULL,
        claimed_at    TEXT    NOT NULL,
        claimed_on    TEXT    NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS claims_by_day ON claims (claimed_on)",
];

/// Pooled handle to the store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) a database file, e.g. `sqlite://draws.db`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        info!("store ready at {}", url);
        Ok(store)
    }

    /// Private in-memory database. A single connection is kept open for the
    /// lifetime of the pool since the data lives in it.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ── Draw results ────────────────────────────────────────────

    /// Declare a result unless its (scope, slot, date) already exists.
    pub async fn declare(&self, new: &NewDrawResult) -> Result<Declaration> {
        let mut conn = self.pool.acquire().await?;
        draws::declare(&mut conn, new).await
    }

    pub async fn lookup(
        &self,
        scope: Scope,
        slot: &str,
        draw_date: NaiveDate,
    ) -> Result<Option<DrawResult>> {
        let mut conn = self.pool.acquire().await?;
        draws::lookup(&mut conn, scope, slot, draw_date).await
    }

    pub async fn results_on(&self, draw_date: NaiveDate) -> Result<Vec<DrawResult>> {
        let mut conn = self.pool.acquire().await?;
        draws::list_for_date(&mut conn, draw_date).await
    }

    // ── Tickets ─────────────────────────────────────────────────

    pub async fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let mut conn = self.pool.acquire().await?;
        tickets::get_ticket(&mut conn, id).await
    }

    pub async fn tickets_for_slot(
        &self,
        draw_date: NaiveDate,
        slot: &str,
        scope: Scope,
    ) -> Result<Vec<Ticket>> {
        let mut conn = self.pool.acquire().await?;
        tickets::list_tickets_for_slot(&mut conn, draw_date, slot, scope).await
    }

    // ── Accounts & rates ────────────────────────────────────────

    pub async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let mut conn = self.pool.acquire().await?;
        accounts::get_account(&mut conn, id, false).await
    }

    /// Register an account (admin surface; used by seeding and tests).
    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        accounts::insert_account(&mut conn, account).await
    }

    pub async fn current_payout_rate(&self) -> Result<Decimal> {
        let mut conn = self.pool.acquire().await?;
        accounts::current_payout_rate(&mut conn).await
    }

    pub async fn set_payout_rate(&self, percentage: Decimal) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        accounts::insert_payout_rate(&mut conn, percentage).await
    }

    // ── Claims ──────────────────────────────────────────────────

    pub async fn claim_for_ticket(&self, ticket_id: i64) -> Result<Option<Claim>> {
        let mut conn = self.pool.acquire().await?;
        claims::find_by_ticket(&mut conn, ticket_id).await
    }

    pub async fn claims_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Claim>> {
        let mut conn = self.pool.acquire().await?;
        claims::list_between(&mut conn, from, to).await
    }
}

/// True when `err` is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Convert a stored u64 column (kept as INTEGER) back.
pub(crate) fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| EngineError::Corrupt(format!("negative {column}: {value}")))
}

pub(crate) fn to_i64(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| EngineError::Consistency(format!("{what} overflows: {value}")))
}
