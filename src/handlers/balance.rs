//! Balance HTTP handlers.
//!
//! This module implements the balance-related API endpoints:
//! - GET /balance?user_id= - Get a user's balance
//! - GET /balances - List every balance
//! - POST /balance/inc - Add money
//! - POST /balance/dec - Remove money
//! - POST /balance/transfer - Move money between users

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::{
    error::AppError,
    models::balance::{
        BalanceQuery, BalanceRequest, BalanceResponse, TransferRequest, TransferResponse,
    },
    services::Coordinator,
};

/// Get the balance of one user.
///
/// # Response
///
/// - **Success (200 OK)**: `{"user_id": 1, "money": "70"}`
/// - **Error (404)**: User has no balance
pub async fn get_balance(
    State(coordinator): State<Coordinator>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Query(query) = query?;
    let balance = coordinator.get_balance(query.user_id).await?;

    Ok(Json(balance.into()))
}

/// List every user balance, ordered by user id.
pub async fn list_balances(
    State(coordinator): State<Coordinator>,
) -> Result<Json<Vec<BalanceResponse>>, AppError> {
    let balances = coordinator.list_balances().await?;

    Ok(Json(balances.into_iter().map(Into::into).collect()))
}

/// Credit a user (add money).
///
/// The balance is created on the first credit.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": 1,
///   "money": "100"
/// }
/// ```
///
/// # Response (200)
///
/// The balance after the credit.
pub async fn increment_balance(
    State(coordinator): State<Coordinator>,
    request: Result<Json<BalanceRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Json(request) = request?;
    let balance = coordinator
        .increment_balance(request.user_id, request.money)
        .await?;

    Ok(Json(balance.into()))
}

/// Debit a user (remove money).
///
/// # Validation
///
/// - User must already have a balance
/// - Balance must cover the amount
pub async fn decrement_balance(
    State(coordinator): State<Coordinator>,
    request: Result<Json<BalanceRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Json(request) = request?;
    let balance = coordinator
        .decrement_balance(request.user_id, request.money)
        .await?;

    Ok(Json(balance.into()))
}

/// Transfer money between users.
///
/// # Atomicity
///
/// Both balances are updated in a single database transaction.
/// Either both succeed or both fail.
///
/// # Validation
///
/// - Both users must already have a balance
/// - Sender must have sufficient balance
/// - Users must be different
pub async fn transfer(
    State(coordinator): State<Coordinator>,
    request: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let Json(request) = request?;
    let outcome = coordinator
        .transfer(request.from_id, request.to_id, request.money)
        .await?;

    Ok(Json(TransferResponse {
        from: outcome.from.into(),
        to: outcome.to.into(),
    }))
}
