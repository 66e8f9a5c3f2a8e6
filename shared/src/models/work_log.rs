//! Work log models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::FieldRef;
use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{
    first_validation_error, require_field_reference, require_non_negative,
    require_non_negative_opt, require_text, RecordError,
};

/// A day's field work (作業日誌)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub field_id: Option<Uuid>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub work_type: String,
    #[serde(default)]
    pub work_hours: Decimal,
    #[serde(default)]
    pub harvest_amount: Option<Decimal>,
    #[serde(default)]
    pub worker_names: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WorkLog {
    pub fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::new(self.field_id, self.field_name.as_deref())
    }
}

impl Record for WorkLog {
    const COLLECTION: Collection = Collection::WorkLogs;

    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("workType", &self.work_type)?;
        require_field_reference(self.field_id, self.field_name.as_deref())?;
        require_non_negative("workHours", self.work_hours)?;
        require_non_negative_opt("harvestAmount", self.harvest_amount)
    }

    fn normalize(&mut self) {
        self.worker_names = self
            .worker_names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
    }
}
