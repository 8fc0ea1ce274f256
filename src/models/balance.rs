//! User balance data models and API request/response types.
//!
//! This module defines:
//! - `UserBalance`: Database entity representing a spendable balance
//! - Request types for increment, decrement and transfer operations
//! - `BalanceResponse` / `TransferResponse`: Response bodies returned to clients

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UserId;

/// Represents a row of the `user_balance` table.
///
/// # Balance Storage
///
/// Balances are stored as `NUMERIC` and handled as `Decimal` so that amounts
/// like `0.10` are exact. The database rejects negative balances with a
/// CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct UserBalance {
    /// Owner of the balance
    pub user_id: UserId,

    /// Current spendable amount, always >= 0
    pub balance: Decimal,
}

/// Query string for `GET /balance`.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub user_id: UserId,
}

/// Request to increment or decrement a user's balance.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": 1,
///   "money": "100.50"
/// }
/// ```
///
/// `money` may be sent as a JSON number or a string.
#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    /// User whose balance changes
    pub user_id: UserId,

    /// Amount to add or remove, must be positive
    pub money: Decimal,
}

/// Request to move money between two users.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_id": 1,
///   "to_id": 2,
///   "money": "25"
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// Both balances are updated in the same database transaction.
/// If the credit fails, the debit is rolled back.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// User to take money from (will decrease)
    pub from_id: UserId,

    /// User to give money to (will increase, must already exist)
    pub to_id: UserId,

    /// Amount to transfer
    pub money: Decimal,
}

/// Response body for balance endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": 1,
///   "money": "70"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub money: Decimal,
}

impl From<UserBalance> for BalanceResponse {
    fn from(balance: UserBalance) -> Self {
        Self {
            user_id: balance.user_id,
            money: balance.balance,
        }
    }
}

/// Response body for `POST /balance/transfer`: both balances after the move.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub from: BalanceResponse,
    pub to: BalanceResponse,
}
