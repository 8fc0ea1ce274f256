//! Release report data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, ServiceId, UserId};

/// Represents a row of the append-only `report` table.
///
/// One entry is written per released reservation, in the same database
/// transaction as the release itself. Entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ReportEntry {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub order_id: OrderId,

    /// Amount released
    pub balance: Decimal,

    /// When the release was committed
    pub date: DateTime<Utc>,
}

/// Query string for `GET /report`.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub user_id: UserId,
}

/// Response body for a single report entry.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": 1,
///   "service_id": 5,
///   "order_id": 9,
///   "money": "30",
///   "date": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub order_id: OrderId,
    pub money: Decimal,
    pub date: DateTime<Utc>,
}

impl From<ReportEntry> for ReportResponse {
    fn from(entry: ReportEntry) -> Self {
        Self {
            user_id: entry.user_id,
            service_id: entry.service_id,
            order_id: entry.order_id,
            money: entry.balance,
            date: entry.date,
        }
    }
}
