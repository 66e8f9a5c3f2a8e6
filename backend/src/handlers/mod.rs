//! HTTP handlers for Farm GAP Records

pub mod health;
pub mod records;
pub mod reporting;
pub mod traceability;
pub mod transfer;

pub use health::health_check;
pub use records::{create_record, delete_record, get_record, list_records, update_record};
pub use reporting::{get_analytics, get_disposal, get_monthly_trend, get_usage};
pub use traceability::get_lot_chains;
pub use transfer::{export_records, import_records};

use axum::{http::header, response::IntoResponse};
use serde::Deserialize;
use shared::{parse_flexible_date, DateRange};

use crate::error::{AppError, AppResult};

/// `start` / `end` query parameters shared by list, export and report endpoints
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

impl RangeQuery {
    /// Both bounds, or neither
    pub fn optional_range(&self) -> AppResult<Option<DateRange>> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (None, None) => Ok(None),
            (start, end) => Ok(Some(to_range(start, end)?)),
        }
    }

    pub fn range(&self) -> AppResult<DateRange> {
        to_range(self.start.as_deref(), self.end.as_deref())
    }

    pub fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

pub(crate) fn to_range(start: Option<&str>, end: Option<&str>) -> AppResult<DateRange> {
    let start = parse_date_param("start", start)?;
    let end = parse_date_param("end", end)?;
    Ok(DateRange::new(start, end)?)
}

fn parse_date_param(name: &str, value: Option<&str>) -> AppResult<chrono::NaiveDate> {
    let value = value.ok_or_else(|| AppError::Validation {
        field: name.to_string(),
        message: format!("{} is required", name),
        message_ja: format!("{}は必須です", name),
    })?;
    parse_flexible_date(value).ok_or_else(|| AppError::Validation {
        field: name.to_string(),
        message: format!("{} must be a date (YYYY-MM-DD)", name),
        message_ja: format!("{}の日付が不正です", name),
    })
}

/// CSV download response
pub(crate) fn csv_response(file_name: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", file_name),
            ),
        ],
        body,
    )
}
