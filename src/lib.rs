//! Balance Manager
//!
//! Tracks per-user balances and per-order reservations for a service
//! marketplace. Users hold a balance; callers can reserve part of it for a
//! (service, order) pair, release that reservation while recording it in an
//! append-only report, or transfer money directly between users.
//!
//! # Layout
//!
//! - `ledger`: balance, reservation and report operations inside a unit of work
//! - `services`: the coordinator that runs them atomically
//! - `store`: the durable store behind the ledgers (PostgreSQL or in-memory)
//! - `handlers`: the HTTP interface

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod services;
pub mod store;
