//! Reservation HTTP handlers.
//!
//! - GET /reserve?user_id=&service_id=&order_id= - Amount held for an order
//! - POST /reserve/inc - Move money from the balance into a reservation
//! - POST /reserve/dec - Release a reservation and write a report row

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::{
    error::AppError,
    models::reserve::{
        ReleaseResponse, ReservationKey, ReservationResponse, ReserveRequest, ReserveResponse,
    },
    services::Coordinator,
};

pub async fn get_reservation(
    State(coordinator): State<Coordinator>,
    key: Result<Query<ReservationKey>, QueryRejection>,
) -> Result<Json<ReservationResponse>, AppError> {
    let Query(key) = key?;
    let reservation = coordinator.get_reservation_balance(key).await?;

    Ok(Json(reservation.into()))
}

/// Reserve money for an order.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": 1,
///   "service_id": 5,
///   "order_id": 9,
///   "money": "30"
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "user_id": 1,
///   "service_id": 5,
///   "order_id": 9,
///   "money": "30",
///   "user_balance": { "user_id": 1, "money": "70" }
/// }
/// ```
pub async fn reserve(
    State(coordinator): State<Coordinator>,
    request: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<ReserveResponse>, AppError> {
    let Json(request) = request?;
    let outcome = coordinator.reserve(request.key(), request.money).await?;

    Ok(Json(ReserveResponse {
        reservation: outcome.reservation.into(),
        user_balance: outcome.user.into(),
    }))
}

/// Release reserved money.
///
/// The released amount is consumed (not returned to the user) and recorded
/// in the report in the same database transaction.
pub async fn release(
    State(coordinator): State<Coordinator>,
    request: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let Json(request) = request?;
    let outcome = coordinator
        .release_reservation(request.key(), request.money)
        .await?;

    Ok(Json(ReleaseResponse {
        reservation: outcome.reservation.into(),
        report: outcome.report.into(),
    }))
}
