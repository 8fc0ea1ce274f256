//! Balance, reservation and report ledgers.
//!
//! Every function here runs inside a unit of work supplied by the caller and
//! never commits on its own. Sequencing several of them into one atomic
//! operation is the job of `services::coordinator`.

pub mod balance;
pub mod error;
pub mod report;
pub mod reservation;

pub use error::LedgerError;
