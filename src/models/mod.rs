//! Data models representing database entities.
//!
//! This module contains the rows stored in `user_balance`, `reserve` and
//! `report`, plus the JSON request/response bodies built from them.

/// User balance model
pub mod balance;
/// Release report model
pub mod report;
/// Reservation model
pub mod reserve;

/// Identifier of a balance holder (`INT` in PostgreSQL).
pub type UserId = i32;

/// Identifier of the service holding a reservation.
pub type ServiceId = i32;

/// Identifier of the order a reservation is held for.
pub type OrderId = i32;
