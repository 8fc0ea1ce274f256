//! PostgreSQL implementation of the store.
//!
//! Each unit of work is one sqlx transaction. Dropping a `PgUnitOfWork`
//! without committing rolls the transaction back, so a cancelled request
//! never leaves a partial effect behind.
//!
//! # Constraint Mapping
//!
//! The schema enforces the non-negative invariant with CHECK constraints and
//! ties reservations and reports to `user_balance` with foreign keys.
//! Violations are translated into ledger errors (see `From<sqlx::Error>`).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction, error::ErrorKind};

use super::{RowLock, Store, UnitOfWork};
use crate::{
    db::DbPool,
    ledger::LedgerError,
    models::{UserId, balance::UserBalance, report::ReportEntry, reserve::ReservationKey},
};

/// Translate database failures into ledger errors.
///
/// - CHECK violation (a balance would go negative) → `InsufficientFunds`
/// - Foreign key violation (no `user_balance` row) → `UserNotFound`
/// - Anything else → `Storage`
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::CheckViolation => return LedgerError::InsufficientFunds,
                ErrorKind::ForeignKeyViolation => return LedgerError::UserNotFound,
                _ => {}
            }
        }
        LedgerError::Storage(err.to_string())
    }
}

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn fetch_balance(
        &mut self,
        user_id: UserId,
        lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError> {
        let sql = match lock {
            RowLock::Unlocked => "SELECT balance FROM user_balance WHERE user_id = $1",
            // FOR UPDATE blocks concurrent debits of this user until we commit
            RowLock::ForUpdate => "SELECT balance FROM user_balance WHERE user_id = $1 FOR UPDATE",
        };

        let balance = sqlx::query_scalar::<_, Decimal>(sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(balance)
    }

    async fn fetch_balances(&mut self) -> Result<Vec<UserBalance>, LedgerError> {
        let balances = sqlx::query_as::<_, UserBalance>(
            "SELECT user_id, balance FROM user_balance ORDER BY user_id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(balances)
    }

    async fn upsert_balance(
        &mut self,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        // A single statement, so two first credits for the same new user
        // cannot both try to insert
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            INSERT INTO user_balance (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET balance = user_balance.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn add_to_balance(
        &mut self,
        user_id: UserId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE user_balance
            SET balance = balance + $1
            WHERE user_id = $2
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn fetch_reservation(
        &mut self,
        key: &ReservationKey,
        lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError> {
        let sql = match lock {
            RowLock::Unlocked => {
                "SELECT balance FROM reserve WHERE user_id = $1 AND service_id = $2 AND order_id = $3"
            }
            RowLock::ForUpdate => {
                "SELECT balance FROM reserve WHERE user_id = $1 AND service_id = $2 AND order_id = $3 FOR UPDATE"
            }
        };

        let balance = sqlx::query_scalar::<_, Decimal>(sql)
            .bind(key.user_id)
            .bind(key.service_id)
            .bind(key.order_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(balance)
    }

    async fn upsert_reservation(
        &mut self,
        key: &ReservationKey,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            INSERT INTO reserve (user_id, service_id, order_id, balance)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, service_id, order_id)
            DO UPDATE SET balance = reserve.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(key.user_id)
        .bind(key.service_id)
        .bind(key.order_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn add_to_reservation(
        &mut self,
        key: &ReservationKey,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE reserve
            SET balance = balance + $1
            WHERE user_id = $2 AND service_id = $3 AND order_id = $4
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(key.user_id)
        .bind(key.service_id)
        .bind(key.order_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn insert_report(&mut self, entry: &ReportEntry) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO report (user_id, service_id, order_id, balance, date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.service_id)
        .bind(entry.order_id)
        .bind(entry.balance)
        .bind(entry.date)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn fetch_reports(&mut self, user_id: UserId) -> Result<Vec<ReportEntry>, LedgerError> {
        let entries = sqlx::query_as::<_, ReportEntry>(
            r#"
            SELECT user_id, service_id, order_id, balance, date
            FROM report
            WHERE user_id = $1
            ORDER BY date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(entries)
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
