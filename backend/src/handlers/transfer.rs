//! CSV export and import handlers

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::csv_transfer::{export_csv, import_csv};
use crate::services::{CsvSchema, ImportSummary, RecordService};
use crate::AppState;

use super::{csv_response, RangeQuery};

/// Download a collection as CSV
pub async fn export_records<T: CsvSchema>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    let service = RecordService::<T>::new(state.store.clone());
    let records = service.list(&user.scope(), query.optional_range()?).await?;
    let csv = export_csv(&records)?;
    Ok(csv_response(T::FILE_NAME, csv))
}

/// Import a CSV body; valid rows are saved, the rest reported per row
pub async fn import_records<T: CsvSchema>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: String,
) -> AppResult<Json<ImportSummary>> {
    let service = RecordService::<T>::new(state.store.clone());
    let summary = import_csv(&service, &user.scope(), &body).await?;
    Ok(Json(summary))
}
