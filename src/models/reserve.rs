//! Reservation data models and API request/response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, ServiceId, UserId, balance::BalanceResponse, report::ReportResponse};

/// Composite key of a reservation.
///
/// Also used directly as the query string of `GET /reserve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct ReservationKey {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub order_id: OrderId,
}

/// Represents a row of the `reserve` table.
///
/// The balance is money already taken out of the owner's `user_balance`
/// row. A fully released reservation stays in the table at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub key: ReservationKey,
    pub balance: Decimal,
}

/// Request to reserve or release money for an order.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": 1,
///   "service_id": 5,
///   "order_id": 9,
///   "money": "30"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub order_id: OrderId,
    pub money: Decimal,
}

impl ReserveRequest {
    pub fn key(&self) -> ReservationKey {
        ReservationKey {
            user_id: self.user_id,
            service_id: self.service_id,
            order_id: self.order_id,
        }
    }
}

/// Response body for `GET /reserve`.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub order_id: OrderId,
    pub money: Decimal,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            user_id: reservation.key.user_id,
            service_id: reservation.key.service_id,
            order_id: reservation.key.order_id,
            money: reservation.balance,
        }
    }
}

/// Response body for `POST /reserve/inc`.
///
/// `money` is the reservation total after the call; `user_balance` is what
/// the user has left to spend.
#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub user_balance: BalanceResponse,
}

/// Response body for `POST /reserve/dec`.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub report: ReportResponse,
}
