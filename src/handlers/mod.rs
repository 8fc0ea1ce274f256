//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body or query string)
//! 2. Calls one coordinator operation
//! 3. Returns HTTP response (JSON, status code)
//!
//! # Endpoints
//!
//! | Method | Path                | Description                          |
//! |--------|---------------------|--------------------------------------|
//! | GET    | `/health`           | Liveness and database check          |
//! | GET    | `/balance`          | Balance of one user                  |
//! | GET    | `/balances`         | Balances of all users                |
//! | POST   | `/balance/inc`      | Credit a user, creating the balance  |
//! | POST   | `/balance/dec`      | Debit a user                         |
//! | POST   | `/balance/transfer` | Move money between two users         |
//! | GET    | `/reserve`          | Amount held for an order             |
//! | POST   | `/reserve/inc`      | Hold money for an order              |
//! | POST   | `/reserve/dec`      | Release held money and report it     |
//! | GET    | `/report`           | Release report of one user           |

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::services::Coordinator;

/// Balance endpoints
pub mod balance;
/// Health check endpoint
pub mod health;
/// Report endpoint
pub mod report;
/// Reservation endpoints
pub mod reserve;

/// Build the router with every route, sharing the coordinator via `State`.
pub fn router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/balance", get(balance::get_balance))
        .route("/balances", get(balance::list_balances))
        .route("/balance/inc", post(balance::increment_balance))
        .route("/balance/dec", post(balance::decrement_balance))
        .route("/balance/transfer", post(balance::transfer))
        .route("/reserve", get(reserve::get_reservation))
        .route("/reserve/inc", post(reserve::reserve))
        .route("/reserve/dec", post(reserve::release))
        .route("/report", get(report::get_report))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}
