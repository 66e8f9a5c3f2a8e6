//! Shipment models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{first_validation_error, require_non_negative, require_text, RecordError};

/// Shipment progress
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    #[default]
    #[serde(rename = "準備中")]
    Preparing,
    #[serde(rename = "発送中")]
    InTransit,
    #[serde(rename = "完了")]
    Completed,
    #[serde(rename = "キャンセル")]
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "準備中",
            ShipmentStatus::InTransit => "発送中",
            ShipmentStatus::Completed => "完了",
            ShipmentStatus::Cancelled => "キャンセル",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shipment of harvested produce
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub shipment_date: Option<NaiveDate>,
    /// Back-reference to the shipped harvest, when known
    #[serde(default)]
    pub harvest_id: Option<Uuid>,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Shipment {
    const COLLECTION: Collection = Collection::Shipments;

    fn record_date(&self) -> Option<NaiveDate> {
        self.shipment_date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("destination", &self.destination)?;
        require_non_negative("quantity", self.quantity)
    }
}
