//! Error kinds produced by the balance ledgers and the coordinator.
//!
//! These stay free of any HTTP detail; `crate::error::AppError` decides how
//! each kind is rendered to clients.

/// Every failure a ledger operation can report.
///
/// Whenever an operation returns one of these, the unit of work it ran in
/// has been rolled back (or was never opened).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Debit, read or transfer against a user with no balance row.
    #[error("user not found")]
    UserNotFound,

    /// Read or release against a reservation key with no row.
    #[error("reservation not found")]
    ReservationNotFound,

    /// The operation would drive a balance or reservation below zero.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Amount is zero or negative.
    #[error("amount must be positive")]
    InvalidAmount,

    /// Sender and recipient of a transfer are the same user.
    #[error("cannot transfer to the same user")]
    SelfTransfer,

    /// The store is unreachable, timed out or failed unexpectedly.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Short machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound => "user_not_found",
            LedgerError::ReservationNotFound => "reservation_not_found",
            LedgerError::InsufficientFunds => "insufficient_funds",
            LedgerError::InvalidAmount => "invalid_amount",
            LedgerError::SelfTransfer => "self_transfer",
            LedgerError::Storage(_) => "storage_error",
        }
    }
}
