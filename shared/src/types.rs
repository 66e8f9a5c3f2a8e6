//! Common types used across the platform

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::validation::RecordError;

/// Document collections, one per record type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Fields,
    Seeds,
    Fertilizers,
    Pesticides,
    Harvests,
    Shipments,
    PesticideUses,
    FertilizerUses,
    WorkLogs,
    Workers,
    Groups,
    Trainings,
    Visitors,
}

impl Collection {
    pub const ALL: [Collection; 13] = [
        Collection::Fields,
        Collection::Seeds,
        Collection::Fertilizers,
        Collection::Pesticides,
        Collection::Harvests,
        Collection::Shipments,
        Collection::PesticideUses,
        Collection::FertilizerUses,
        Collection::WorkLogs,
        Collection::Workers,
        Collection::Groups,
        Collection::Trainings,
        Collection::Visitors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Fields => "fields",
            Collection::Seeds => "seeds",
            Collection::Fertilizers => "fertilizers",
            Collection::Pesticides => "pesticides",
            Collection::Harvests => "harvests",
            Collection::Shipments => "shipments",
            Collection::PesticideUses => "pesticide-uses",
            Collection::FertilizerUses => "fertilizer-uses",
            Collection::WorkLogs => "work-logs",
            Collection::Workers => "workers",
            Collection::Groups => "groups",
            Collection::Trainings => "trainings",
            Collection::Visitors => "visitors",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Workers and groups are shared within an organization
    pub fn is_organization_scoped(&self) -> bool {
        matches!(self, Collection::Workers | Collection::Groups)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record together with its ownership metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Document<T> {
    /// Wrap a record as a freshly created document
    pub fn new(owner_id: impl Into<String>, record: T) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            organization_id: None,
            created_at: now,
            updated_at: now,
            record,
        }
    }
}

/// Inclusive calendar date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RecordError> {
        if start > end {
            return Err(RecordError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Split into calendar months, each clipped to the range
    pub fn months(&self) -> Vec<DateRange> {
        let mut months = Vec::new();
        let mut cursor = self.start;
        while cursor <= self.end {
            let next_month = first_of_next_month(cursor);
            let month_end = next_month
                .and_then(|d| d.pred_opt())
                .map_or(self.end, |d| d.min(self.end));
            months.push(DateRange {
                start: cursor,
                end: month_end,
            });
            match next_month {
                Some(next) => cursor = next,
                None => break,
            }
        }
        months
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// `yyyy-MM` key for monthly grouping
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD` (month and day may be unpadded)
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let parts: Vec<&str> = if trimmed.contains('/') {
        trimmed.split('/').collect()
    } else {
        trimmed.split('-').collect()
    };
    if parts.len() != 3 || parts[0].len() != 4 {
        return None;
    }
    let year = parts[0].parse().ok()?;
    let month = parts[1].parse().ok()?;
    let day = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalize a date cell to zero-padded `YYYY-MM-DD`
pub fn normalize_date(input: &str) -> Option<String> {
    parse_flexible_date(input).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Lenient date deserializer for stored documents.
///
/// Accepts plain dates in either separator style and RFC 3339 timestamps.
/// Anything else becomes `None`, which excludes the record from
/// date-constrained attribution instead of failing the whole read.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_flexible_date(&s).or_else(|| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.date_naive())
        }),
        _ => None,
    })
}
