//! In-process store used by tests and local experiments.
//!
//! A unit of work holds the table lock for its whole lifetime and mutates a
//! private copy of the tables. `commit` swaps the copy in; `rollback` or a
//! plain drop throws it away. Units of work are therefore fully serialized,
//! which is stricter than row locking but gives the same guarantees.
//!
//! The same constraints as the PostgreSQL schema are checked on every write.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{RowLock, Store, UnitOfWork};
use crate::{
    ledger::LedgerError,
    models::{UserId, balance::UserBalance, report::ReportEntry, reserve::ReservationKey},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    balances: BTreeMap<UserId, Decimal>,
    reservations: BTreeMap<ReservationKey, Decimal>,
    reports: Vec<ReportEntry>,
}

/// Store keeping all rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    reports_unavailable: Arc<AtomicBool>,
    reports_stalled: Arc<AtomicBool>,
    commit_delay_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent report insert fail with a storage error.
    pub fn fail_report_inserts(&self, fail: bool) {
        self.reports_unavailable.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent report insert hang forever.
    pub fn stall_report_inserts(&self, stall: bool) {
        self.reports_stalled.store(stall, Ordering::SeqCst);
    }

    /// Make every subsequent commit take at least `delay`.
    pub fn delay_commits(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.commit_delay_ms.store(millis, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            reports_unavailable: self.reports_unavailable.load(Ordering::SeqCst),
            reports_stalled: self.reports_stalled.load(Ordering::SeqCst),
            commit_delay: Duration::from_millis(self.commit_delay_ms.load(Ordering::SeqCst)),
        }))
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Unit of work over a private copy of the tables.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    reports_unavailable: bool,
    reports_stalled: bool,
    commit_delay: Duration,
}

/// `current + delta`, rejecting overflow and negative results like the
/// `NUMERIC` columns and CHECK constraints do.
fn apply(current: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    let value = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::Storage("numeric overflow".to_string()))?;
    if value < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds);
    }
    Ok(value)
}

impl MemoryUnitOfWork {
    fn user_exists(&self, user_id: UserId) -> Result<(), LedgerError> {
        if self.working.balances.contains_key(&user_id) {
            Ok(())
        } else {
            Err(LedgerError::UserNotFound)
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn fetch_balance(
        &mut self,
        user_id: UserId,
        _lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError> {
        Ok(self.working.balances.get(&user_id).copied())
    }

    async fn fetch_balances(&mut self) -> Result<Vec<UserBalance>, LedgerError> {
        Ok(self
            .working
            .balances
            .iter()
            .map(|(user_id, balance)| UserBalance {
                user_id: *user_id,
                balance: *balance,
            })
            .collect())
    }

    async fn upsert_balance(
        &mut self,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let current = self.working.balances.get(&user_id).copied().unwrap_or_default();
        let updated = apply(current, amount)?;
        self.working.balances.insert(user_id, updated);
        Ok(updated)
    }

    async fn add_to_balance(
        &mut self,
        user_id: UserId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let Some(balance) = self.working.balances.get_mut(&user_id) else {
            return Ok(None);
        };
        let updated = apply(*balance, delta)?;
        *balance = updated;
        Ok(Some(updated))
    }

    async fn fetch_reservation(
        &mut self,
        key: &ReservationKey,
        _lock: RowLock,
    ) -> Result<Option<Decimal>, LedgerError> {
        Ok(self.working.reservations.get(key).copied())
    }

    async fn upsert_reservation(
        &mut self,
        key: &ReservationKey,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        self.user_exists(key.user_id)?;
        let current = self.working.reservations.get(key).copied().unwrap_or_default();
        let updated = apply(current, amount)?;
        self.working.reservations.insert(*key, updated);
        Ok(updated)
    }

    async fn add_to_reservation(
        &mut self,
        key: &ReservationKey,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let Some(balance) = self.working.reservations.get_mut(key) else {
            return Ok(None);
        };
        let updated = apply(*balance, delta)?;
        *balance = updated;
        Ok(Some(updated))
    }

    async fn insert_report(&mut self, entry: &ReportEntry) -> Result<(), LedgerError> {
        if self.reports_unavailable {
            return Err(LedgerError::Storage("report table unavailable".to_string()));
        }
        if self.reports_stalled {
            std::future::pending::<()>().await;
        }
        self.user_exists(entry.user_id)?;
        apply(Decimal::ZERO, entry.balance)?;
        self.working.reports.push(entry.clone());
        Ok(())
    }

    async fn fetch_reports(&mut self, user_id: UserId) -> Result<Vec<ReportEntry>, LedgerError> {
        Ok(self
            .working
            .reports
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryUnitOfWork {
            mut guard,
            working,
            commit_delay,
            ..
        } = *self;
        if !commit_delay.is_zero() {
            tokio::time::sleep(commit_delay).await;
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn commit_publishes_changes() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.upsert_balance(1, dec!(10)).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(
            uow.fetch_balance(1, RowLock::Unlocked).await.unwrap(),
            Some(dec!(10))
        );
    }

    #[tokio::test]
    async fn rollback_and_drop_discard_changes() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.upsert_balance(1, dec!(10)).await.unwrap();
        uow.rollback().await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            uow.upsert_balance(2, dec!(10)).await.unwrap();
        }

        let mut uow = store.begin().await.unwrap();
        assert!(uow.fetch_balances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_writes_are_rejected() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.upsert_balance(1, dec!(5)).await.unwrap();

        let err = uow.add_to_balance(1, dec!(-6)).await.unwrap_err();
        assert_eq!(err, LedgerError::InsufficientFunds);
        assert_eq!(
            uow.fetch_balance(1, RowLock::ForUpdate).await.unwrap(),
            Some(dec!(5))
        );
    }

    #[tokio::test]
    async fn overflow_is_a_storage_error() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.upsert_balance(1, Decimal::MAX).await.unwrap();

        let err = uow.upsert_balance(1, Decimal::MAX).await.unwrap_err();
        assert_eq!(err, LedgerError::Storage("numeric overflow".to_string()));

        let err = uow.add_to_balance(1, dec!(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(
            uow.fetch_balance(1, RowLock::Unlocked).await.unwrap(),
            Some(Decimal::MAX)
        );
    }

    #[tokio::test]
    async fn reservations_require_existing_user() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let key = ReservationKey {
            user_id: 7,
            service_id: 1,
            order_id: 1,
        };

        let err = uow.upsert_reservation(&key, dec!(1)).await.unwrap_err();
        assert_eq!(err, LedgerError::UserNotFound);
    }
}
