//! Harvest models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::FieldRef;
use crate::analytics::disposal_rate;
use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{
    first_validation_error, require_field_reference, require_non_negative, require_text,
    RecordError,
};

/// A harvest record
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Harvest {
    #[serde(default)]
    pub field_id: Option<Uuid>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub crop_name: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub harvest_date: Option<NaiveDate>,
    /// Shipped-grade quantity
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "quality")]
    pub quality_grade: Option<String>,
    #[serde(default)]
    pub disposal_amount: Decimal,
    #[serde(default)]
    pub disposal_reason: Option<String>,
    /// Derived: disposal / (quantity + disposal) * 100, one decimal
    #[serde(default)]
    pub disposal_rate: Decimal,
    /// Derived: quantity + disposal
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Harvest {
    pub fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::new(self.field_id, self.field_name.as_deref())
    }

    /// Recompute the stored totals from quantity and disposal
    pub fn derive_totals(&mut self) {
        self.total_amount = self.quantity + self.disposal_amount;
        self.disposal_rate = disposal_rate(self.quantity, self.disposal_amount);
    }
}

impl Record for Harvest {
    const COLLECTION: Collection = Collection::Harvests;

    fn record_date(&self) -> Option<NaiveDate> {
        self.harvest_date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("cropName", &self.crop_name)?;
        require_field_reference(self.field_id, self.field_name.as_deref())?;
        require_non_negative("quantity", self.quantity)?;
        require_non_negative("disposalAmount", self.disposal_amount)
    }

    fn normalize(&mut self) {
        self.derive_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn harvest(quantity: i64, disposal: i64) -> Harvest {
        Harvest {
            field_name: Some("A".to_string()),
            crop_name: "Tomato".to_string(),
            quantity: Decimal::from(quantity),
            disposal_amount: Decimal::from(disposal),
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_totals() {
        let mut h = harvest(80, 20);
        h.normalize();
        assert_eq!(h.total_amount, Decimal::from(100));
        assert_eq!(h.disposal_rate, Decimal::from_str("20.0").unwrap());
    }

    #[test]
    fn test_derive_totals_rounds_to_one_decimal() {
        let mut h = harvest(2, 1);
        h.normalize();
        assert_eq!(h.disposal_rate, Decimal::from_str("33.3").unwrap());
    }

    #[test]
    fn test_zero_total_has_zero_rate() {
        let mut h = harvest(0, 0);
        h.normalize();
        assert_eq!(h.disposal_rate, Decimal::ZERO);
    }

    #[test]
    fn test_requires_field_reference() {
        let mut h = harvest(10, 0);
        h.field_name = None;
        assert!(Record::validate(&h).is_err());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let h = harvest(-1, 0);
        assert_eq!(
            Record::validate(&h),
            Err(RecordError::Negative {
                field: "quantity".to_string()
            })
        );
    }

    #[test]
    fn test_quality_alias() {
        let h: Harvest = serde_json::from_str(
            r#"{"cropName":"Tomato","fieldName":"A","quantity":"5","quality":"A品"}"#,
        )
        .unwrap();
        assert_eq!(h.quality_grade.as_deref(), Some("A品"));
    }
}
