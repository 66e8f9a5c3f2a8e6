//! Record CRUD handlers, generic over the record type

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use shared::{Document, Record};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::RecordService;
use crate::AppState;

use super::RangeQuery;

/// List records, optionally within `start`..`end`
pub async fn list_records<T: Record>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<Document<T>>>> {
    let service = RecordService::<T>::new(state.store.clone());
    let records = service.list(&user.scope(), query.optional_range()?).await?;
    Ok(Json(records))
}

pub async fn get_record<T: Record>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Document<T>>> {
    let service = RecordService::<T>::new(state.store.clone());
    Ok(Json(service.get(&user.scope(), id).await?))
}

pub async fn create_record<T: Record>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(record): Json<T>,
) -> AppResult<(StatusCode, Json<Document<T>>)> {
    let service = RecordService::<T>::new(state.store.clone());
    let created = service.create(&user.scope(), record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_record<T: Record>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(record): Json<T>,
) -> AppResult<Json<Document<T>>> {
    let service = RecordService::<T>::new(state.store.clone());
    Ok(Json(service.update(&user.scope(), id, record).await?))
}

pub async fn delete_record<T: Record>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = RecordService::<T>::new(state.store.clone());
    service.delete(&user.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
