//! Durable store abstraction.
//!
//! The ledgers never talk to a database directly. They run against a
//! [`UnitOfWork`] opened from a [`Store`], which is injected into the
//! coordinator at construction time.
//!
//! # Implementations
//!
//! - [`postgres::PgStore`]: PostgreSQL through sqlx, used by the server
//! - [`memory::MemoryStore`]: in-process tables, used by tests

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    ledger::LedgerError,
    models::{UserId, balance::UserBalance, report::ReportEntry, reserve::ReservationKey},
};

pub mod memory;
pub mod postgres;

/// Whether a read should lock the row until the unit of work ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// Plain read
    Unlocked,
    /// `SELECT ... FOR UPDATE`
    ForUpdate,
}

/// A source of atomic units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Row-level operations executed inside one atomic unit of work.
///
/// Implementors MUST:
/// 1. Make every change visible to other units of work only after `commit`
/// 2. Discard every change on `rollback` or when dropped without `commit`
/// 3. Reject any write leaving a balance or reservation below zero with
///    `LedgerError::InsufficientFunds`
/// 4. Reject reservation and report rows for unknown users with
///    `LedgerError::UserNotFound`
#[async_trait]
pub trait UnitOfWork: Send {
    async fn fetch_balance(
        &mut self,
        user_id: UserId,
        lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError>;

    /// All balances ordered by user id.
    async fn fetch_balances(&mut self) -> Result<Vec<UserBalance>, LedgerError>;

    /// Add `amount` to the balance, creating the row if missing. Returns the new balance.
    async fn upsert_balance(
        &mut self,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError>;

    /// Add `delta` (possibly negative) to an existing balance.
    /// Returns `None` if there is no row for `user_id`.
    async fn add_to_balance(
        &mut self,
        user_id: UserId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError>;

    async fn fetch_reservation(
        &mut self,
        key: &ReservationKey,
        lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError>;

    /// Add `amount` to the reservation, creating the row if missing. Returns the new balance.
    async fn upsert_reservation(
        &mut self,
        key: &ReservationKey,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError>;

    /// Add `delta` (possibly negative) to an existing reservation.
    /// Returns `None` if there is no row for `key`.
    async fn add_to_reservation(
        &mut self,
        key: &ReservationKey,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError>;

    async fn insert_report(&mut self, entry: &ReportEntry) -> Result<(), LedgerError>;

    /// Report entries of a user, oldest first.
    async fn fetch_reports(&mut self, user_id: UserId) -> Result<Vec<ReportEntry>, LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
