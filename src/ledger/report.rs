//! Report log: append-only record of released reservations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::LedgerError;
use crate::{
    models::{UserId, report::ReportEntry, reserve::ReservationKey},
    store::UnitOfWork,
};

/// Record a release of `amount` for `key` at `date`.
pub async fn append(
    uow: &mut dyn UnitOfWork,
    key: &ReservationKey,
    amount: Decimal,
    date: DateTime<Utc>,
) -> Result<ReportEntry, LedgerError> {
    let entry = ReportEntry {
        user_id: key.user_id,
        service_id: key.service_id,
        order_id: key.order_id,
        balance: amount,
        date,
    };

    uow.insert_report(&entry).await?;

    Ok(entry)
}

pub async fn list(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
) -> Result<Vec<ReportEntry>, LedgerError> {
    uow.fetch_reports(user_id).await
}
