//! Transaction coordinator - Core business logic for balance movements.
//!
//! This service handles:
//! - Amount validation
//! - Sequencing ledger steps inside one unit of work
//! - Commit on success, rollback on any failure
//! - Bounding every operation with a timeout
//!
//! # Atomicity Guarantees
//!
//! Every mutating operation runs in exactly one unit of work. Either all of
//! its steps are committed or none are: a transfer never leaves a debit
//! without its credit, and a release never exists without its report row.
//!
//! # Cancellation
//!
//! If the caller drops the returned future (client disconnect) or the
//! timeout fires, the open unit of work is dropped and rolled back.
//!
//! The timeout covers opening the unit of work and the ledger steps, not the
//! commit. Once a commit has been issued the operation is never reported as
//! timed out, so a `Storage` timeout error always means nothing was applied.

use chrono::Utc;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    ledger::{LedgerError, balance, report, reservation},
    models::{
        UserId,
        balance::UserBalance,
        report::ReportEntry,
        reserve::{Reservation, ReservationKey},
    },
    store::{Store, UnitOfWork},
};

/// Default bound on a single operation, including waiting for row locks.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Balances of both parties after a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub from: UserBalance,
    pub to: UserBalance,
}

/// State after reserving money for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveOutcome {
    /// What the user has left to spend
    pub user: UserBalance,
    /// Total now held for the order
    pub reservation: Reservation,
}

/// State after releasing a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// What is still held for the order
    pub reservation: Reservation,
    /// The report row written for this release
    pub report: ReportEntry,
}

/// Runs ledger operations as all-or-nothing units of work.
///
/// Holds no balances itself; the injected store is the only source of truth.
/// Cheap to clone.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl Coordinator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the store is reachable.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        self.bounded(self.store.ping()).await
    }

    /// Add money to a user's balance, creating the balance on first credit.
    ///
    /// Not idempotent: calling it twice credits twice.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `Storage`: store failure
    pub async fn increment_balance(
        &self,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<UserBalance, LedgerError> {
        ensure_positive(amount)?;

        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = balance::credit(uow.as_mut(), user_id, amount).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let balance = settle("increment_balance", uow, result).await?;

        tracing::info!(user_id, %amount, %balance, "balance incremented");
        Ok(UserBalance { user_id, balance })
    }

    /// Remove money from a user's balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `UserNotFound`: user has no balance
    /// - `InsufficientFunds`: balance is lower than amount
    /// - `Storage`: store failure
    pub async fn decrement_balance(
        &self,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<UserBalance, LedgerError> {
        ensure_positive(amount)?;

        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = balance::debit(uow.as_mut(), user_id, amount).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let balance = settle("decrement_balance", uow, result).await?;

        tracing::info!(user_id, %amount, %balance, "balance decremented");
        Ok(UserBalance { user_id, balance })
    }

    /// Move money from one user to another.
    ///
    /// # Process
    ///
    /// 1. Lock both balance rows, lowest user id first
    /// 2. Debit the sender
    /// 3. Credit the recipient, who must already have a balance
    /// 4. Commit (or rollback on error)
    ///
    /// Locking in a fixed order keeps two opposing transfers from
    /// deadlocking each other.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `SelfTransfer`: sender and recipient are the same user
    /// - `UserNotFound`: sender or recipient has no balance
    /// - `InsufficientFunds`: sender's balance is lower than amount
    /// - `Storage`: store failure
    pub async fn transfer(
        &self,
        from_id: UserId,
        to_id: UserId,
        amount: Decimal,
    ) -> Result<TransferOutcome, LedgerError> {
        ensure_positive(amount)?;
        if from_id == to_id {
            return Err(LedgerError::SelfTransfer);
        }

        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result: Result<TransferOutcome, LedgerError> = async {
                    let (first, second) = if from_id < to_id {
                        (from_id, to_id)
                    } else {
                        (to_id, from_id)
                    };
                    balance::lock(uow.as_mut(), first).await?;
                    balance::lock(uow.as_mut(), second).await?;

                    let from = balance::debit(uow.as_mut(), from_id, amount).await?;
                    let to = balance::credit_existing(uow.as_mut(), to_id, amount).await?;

                    Ok(TransferOutcome {
                        from: UserBalance {
                            user_id: from_id,
                            balance: from,
                        },
                        to: UserBalance {
                            user_id: to_id,
                            balance: to,
                        },
                    })
                }
                .await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let outcome = settle("transfer", uow, result).await?;

        tracing::info!(
            from_id,
            to_id,
            %amount,
            from_balance = %outcome.from.balance,
            to_balance = %outcome.to.balance,
            "transfer completed"
        );
        Ok(outcome)
    }

    /// Hold money from a user's balance for a (service, order) pair.
    ///
    /// The amount leaves the spendable balance and is added to the
    /// reservation, which is created on first use.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `UserNotFound`: user has no balance
    /// - `InsufficientFunds`: balance is lower than amount
    /// - `Storage`: store failure
    pub async fn reserve(
        &self,
        key: ReservationKey,
        amount: Decimal,
    ) -> Result<ReserveOutcome, LedgerError> {
        ensure_positive(amount)?;

        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result: Result<ReserveOutcome, LedgerError> = async {
                    let user_balance = balance::debit(uow.as_mut(), key.user_id, amount).await?;
                    let held = reservation::hold(uow.as_mut(), &key, amount).await?;

                    Ok(ReserveOutcome {
                        user: UserBalance {
                            user_id: key.user_id,
                            balance: user_balance,
                        },
                        reservation: Reservation { key, balance: held },
                    })
                }
                .await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let outcome = settle("reserve", uow, result).await?;

        tracing::info!(
            user_id = key.user_id,
            service_id = key.service_id,
            order_id = key.order_id,
            %amount,
            reserved = %outcome.reservation.balance,
            "money reserved"
        );
        Ok(outcome)
    }

    /// Finalize (part of) a reservation and record it in the report.
    ///
    /// The released money is consumed by the service; it is not returned
    /// to the user's balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `ReservationNotFound`: nothing reserved for this key
    /// - `InsufficientFunds`: reservation is lower than amount
    /// - `Storage`: store failure
    pub async fn release_reservation(
        &self,
        key: ReservationKey,
        amount: Decimal,
    ) -> Result<ReleaseOutcome, LedgerError> {
        ensure_positive(amount)?;

        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result: Result<ReleaseOutcome, LedgerError> = async {
                    let remaining = reservation::release(uow.as_mut(), &key, amount).await?;
                    let entry = report::append(uow.as_mut(), &key, amount, Utc::now()).await?;

                    Ok(ReleaseOutcome {
                        reservation: Reservation {
                            key,
                            balance: remaining,
                        },
                        report: entry,
                    })
                }
                .await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let outcome = settle("release_reservation", uow, result).await?;

        tracing::info!(
            user_id = key.user_id,
            service_id = key.service_id,
            order_id = key.order_id,
            %amount,
            remaining = %outcome.reservation.balance,
            "reservation released"
        );
        Ok(outcome)
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<UserBalance, LedgerError> {
        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = balance::read(uow.as_mut(), user_id).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let balance = settle("get_balance", uow, result).await?;

        Ok(UserBalance { user_id, balance })
    }

    pub async fn list_balances(&self) -> Result<Vec<UserBalance>, LedgerError> {
        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = balance::list(uow.as_mut()).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        settle("list_balances", uow, result).await
    }

    pub async fn get_reservation_balance(
        &self,
        key: ReservationKey,
    ) -> Result<Reservation, LedgerError> {
        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = reservation::read(uow.as_mut(), &key).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        let balance = settle("get_reservation_balance", uow, result).await?;

        Ok(Reservation { key, balance })
    }

    /// Report entries of a user, oldest first.
    pub async fn get_report(&self, user_id: UserId) -> Result<Vec<ReportEntry>, LedgerError> {
        let (uow, result) = self
            .bounded(async {
                let mut uow = self.store.begin().await?;
                let result = report::list(uow.as_mut(), user_id).await;
                Ok::<_, LedgerError>((uow, result))
            })
            .await?;
        settle("get_report", uow, result).await
    }

    /// Run `operation`, dropping it (and any open unit of work) on timeout.
    ///
    /// Callers commit after this returns, outside the deadline.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "operation timed out, rolled back");
                Err(LedgerError::Storage(format!(
                    "operation timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

/// Commit the unit of work if every step succeeded, roll it back otherwise.
async fn settle<T>(
    operation: &'static str,
    uow: Box<dyn UnitOfWork>,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(operation, error = %rollback_err, "rollback failed");
            }
            match &err {
                LedgerError::Storage(_) => tracing::error!(operation, error = %err, "operation failed"),
                _ => tracing::warn!(operation, error = %err, "operation rejected"),
            }
            Err(err)
        }
    }
}
