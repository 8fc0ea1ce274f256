//! Balance ledger: spendable money per user.

use rust_decimal::Decimal;

use super::LedgerError;
use crate::{
    models::{UserId, balance::UserBalance},
    store::{RowLock, UnitOfWork},
};

/// Add `amount` to the user's balance, creating the balance if the user is new.
///
/// Returns the balance after the credit.
pub async fn credit(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    uow.upsert_balance(user_id, amount).await
}

/// Add `amount` to a balance that must already exist.
///
/// # Errors
///
/// - `UserNotFound`: no balance row for `user_id`
pub async fn credit_existing(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    uow.add_to_balance(user_id, amount)
        .await?
        .ok_or(LedgerError::UserNotFound)
}

/// Subtract `amount` from the user's balance.
///
/// # Process
///
/// 1. Lock the balance row (FOR UPDATE)
/// 2. Check it covers `amount`
/// 3. Update it
///
/// The store's own non-negative constraint backs up step 2.
///
/// # Errors
///
/// - `UserNotFound`: no balance row for `user_id`
/// - `InsufficientFunds`: balance is lower than `amount`
pub async fn debit(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    let current = uow
        .fetch_balance(user_id, RowLock::ForUpdate)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    if current < amount {
        return Err(LedgerError::InsufficientFunds);
    }

    uow.add_to_balance(user_id, -amount)
        .await?
        .ok_or(LedgerError::UserNotFound)
}

/// Lock the user's balance row until the unit of work ends.
///
/// Returns the balance, or `None` for an unknown user.
pub async fn lock(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
) -> Result<Option<Decimal>, LedgerError> {
    uow.fetch_balance(user_id, RowLock::ForUpdate).await
}

pub async fn read(uow: &mut dyn UnitOfWork, user_id: UserId) -> Result<Decimal, LedgerError> {
    uow.fetch_balance(user_id, RowLock::Unlocked)
        .await?
        .ok_or(LedgerError::UserNotFound)
}

pub async fn list(uow: &mut dyn UnitOfWork) -> Result<Vec<UserBalance>, LedgerError> {
    uow.fetch_balances().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, memory::MemoryStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn credit_creates_then_accumulates() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        assert_eq!(credit(uow.as_mut(), 1, dec!(10)).await.unwrap(), dec!(10));
        assert_eq!(credit(uow.as_mut(), 1, dec!(2.5)).await.unwrap(), dec!(12.5));
        assert_eq!(read(uow.as_mut(), 1).await.unwrap(), dec!(12.5));
    }

    #[tokio::test]
    async fn debit_checks_funds_and_existence() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        assert_eq!(
            debit(uow.as_mut(), 1, dec!(1)).await.unwrap_err(),
            LedgerError::UserNotFound
        );

        credit(uow.as_mut(), 1, dec!(10)).await.unwrap();
        assert_eq!(
            debit(uow.as_mut(), 1, dec!(10.01)).await.unwrap_err(),
            LedgerError::InsufficientFunds
        );
        assert_eq!(debit(uow.as_mut(), 1, dec!(10)).await.unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn credit_existing_does_not_create_users() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        assert_eq!(
            credit_existing(uow.as_mut(), 3, dec!(1)).await.unwrap_err(),
            LedgerError::UserNotFound
        );
        assert!(lock(uow.as_mut(), 3).await.unwrap().is_none());
        assert!(list(uow.as_mut()).await.unwrap().is_empty());
    }
}
