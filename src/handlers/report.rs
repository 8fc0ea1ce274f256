//! Report HTTP handler.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::{
    error::AppError,
    models::report::{ReportQuery, ReportResponse},
    services::Coordinator,
};

/// List the releases recorded for a user, oldest first.
///
/// An unknown user simply has an empty report.
pub async fn get_report(
    State(coordinator): State<Coordinator>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Vec<ReportResponse>>, AppError> {
    let Query(query) = query?;
    let entries = coordinator.get_report(query.user_id).await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
