//! Reporting handlers for analytics and data export

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use shared::{DisposalSummary, MonthlyTrend};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::ReportingService;
use crate::AppState;

use super::{csv_response, RangeQuery};

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(
        state.store.clone(),
        state.config.reports.month_fetch_concurrency,
    )
}

/// Harvest analytics grouped by crop, field and month
pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Response> {
    let analytics = service(&state).get_analytics(&user.scope(), query.range()?).await?;

    if query.wants_csv() {
        let rows = ReportingService::analytics_rows(&analytics);
        let csv = ReportingService::export_to_csv(&rows)?;
        return Ok(csv_response("harvest_analytics", csv).into_response());
    }
    Ok(Json(analytics).into_response())
}

/// Monthly trend; aborted when the server begins shutting down
pub async fn get_monthly_trend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<MonthlyTrend>> {
    let trend = service(&state)
        .get_monthly_trend(&user.scope(), query.range()?, &state.shutdown)
        .await?;
    Ok(Json(trend))
}

/// Pesticide and fertilizer usage
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Response> {
    let usage = service(&state).get_usage(&user.scope(), query.range()?).await?;

    if query.wants_csv() {
        let csv = ReportingService::export_to_csv(&ReportingService::usage_rows(&usage))?;
        return Ok(csv_response("input_usage", csv).into_response());
    }
    Ok(Json(usage).into_response())
}

/// Disposal summary by reason
pub async fn get_disposal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DisposalSummary>> {
    let summary = service(&state).get_disposal(&user.scope(), query.range()?).await?;
    Ok(Json(summary))
}
