//! Seed, fertilizer and pesticide master data

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{first_validation_error, require_non_negative_opt, require_text, RecordError};

/// A purchased seed or seedling lot
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Seed treatment (消毒) applied by the supplier
    #[serde(default)]
    pub treated: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Seed {
    const COLLECTION: Collection = Collection::Seeds;

    fn record_date(&self) -> Option<NaiveDate> {
        self.purchase_date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)?;
        require_non_negative_opt("quantity", self.quantity)
    }
}

/// A registered fertilizer product
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fertilizer {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// e.g. 化成肥料, 有機肥料
    #[serde(default)]
    pub fertilizer_type: Option<String>,
    /// N-P-K notation, e.g. "8-8-8"
    #[serde(default)]
    pub components: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Fertilizer {
    const COLLECTION: Collection = Collection::Fertilizers;

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)
    }
}

/// A registered pesticide product
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pesticide {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// 農薬登録番号
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub active_ingredient: Option<String>,
    #[serde(default)]
    pub target_crops: Option<String>,
    #[serde(default)]
    pub target_pests: Option<String>,
    /// Days that must pass between the last application and harvest
    #[serde(default)]
    pub pre_harvest_interval_days: Option<i32>,
    #[serde(default)]
    pub max_applications: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Pesticide {
    const COLLECTION: Collection = Collection::Pesticides;

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)?;
        if self.pre_harvest_interval_days.is_some_and(|d| d < 0) {
            return Err(RecordError::Negative {
                field: "preHarvestIntervalDays".to_string(),
            });
        }
        if self.max_applications.is_some_and(|n| n < 0) {
            return Err(RecordError::Negative {
                field: "maxApplications".to_string(),
            });
        }
        Ok(())
    }
}
