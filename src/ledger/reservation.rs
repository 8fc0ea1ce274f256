//! Reservation ledger: money held per (user, service, order).
//!
//! Holding never mints money: callers pair `hold` with a balance debit of
//! the same amount in the same unit of work. Releasing consumes the money;
//! nothing goes back to the user's balance.

use rust_decimal::Decimal;

use super::LedgerError;
use crate::{
    models::reserve::ReservationKey,
    store::{RowLock, UnitOfWork},
};

/// Add `amount` to the reservation, creating it on first use.
///
/// Returns the reservation balance after the hold.
pub async fn hold(
    uow: &mut dyn UnitOfWork,
    key: &ReservationKey,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    uow.upsert_reservation(key, amount).await
}

pub async fn read(uow: &mut dyn UnitOfWork, key: &ReservationKey) -> Result<Decimal, LedgerError> {
    uow.fetch_reservation(key, RowLock::Unlocked)
        .await?
        .ok_or(LedgerError::ReservationNotFound)
}

/// Subtract `amount` from the reservation.
///
/// A reservation released down to zero is kept at zero.
///
/// # Errors
///
/// - `ReservationNotFound`: no reservation for `key`
/// - `InsufficientFunds`: reservation is lower than `amount`
pub async fn release(
    uow: &mut dyn UnitOfWork,
    key: &ReservationKey,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    let held = uow
        .fetch_reservation(key, RowLock::ForUpdate)
        .await?
        .ok_or(LedgerError::ReservationNotFound)?;

    if held < amount {
        return Err(LedgerError::InsufficientFunds);
    }

    uow.add_to_reservation(key, -amount)
        .await?
        .ok_or(LedgerError::ReservationNotFound)
}
