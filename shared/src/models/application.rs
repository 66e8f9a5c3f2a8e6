//! Pesticide and fertilizer application records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::FieldRef;
use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{
    first_validation_error, require_field_reference, require_non_negative_opt, require_text,
    RecordError,
};

/// A pesticide application (農薬使用記録)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PesticideUse {
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub field_id: Option<Uuid>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub pesticide_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub pesticide_name: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Dilution factor, e.g. 1000 for 1000倍
    #[serde(default)]
    pub dilution_rate: Option<Decimal>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub applicator: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    /// Air temperature in °C
    #[serde(default)]
    pub temperature: Option<Decimal>,
    #[serde(default)]
    pub wind: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PesticideUse {
    pub fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::new(self.field_id, self.field_name.as_deref())
    }
}

impl Record for PesticideUse {
    const COLLECTION: Collection = Collection::PesticideUses;

    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("pesticideName", &self.pesticide_name)?;
        require_field_reference(self.field_id, self.field_name.as_deref())?;
        require_non_negative_opt("amount", self.amount)?;
        require_non_negative_opt("dilutionRate", self.dilution_rate)
    }
}

/// A fertilizer application (施肥記録)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FertilizerUse {
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub field_id: Option<Uuid>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub fertilizer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub fertilizer_name: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub applicator: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FertilizerUse {
    pub fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::new(self.field_id, self.field_name.as_deref())
    }
}

impl Record for FertilizerUse {
    const COLLECTION: Collection = Collection::FertilizerUses;

    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("fertilizerName", &self.fertilizer_name)?;
        require_field_reference(self.field_id, self.field_name.as_deref())?;
        require_non_negative_opt("amount", self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pesticide_use_requires_product_name() {
        let usage = PesticideUse {
            field_name: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Record::validate(&usage),
            Err(RecordError::Required {
                field: "pesticideName".to_string()
            })
        );
    }

    #[test]
    fn test_fertilizer_use_rejects_negative_amount() {
        let usage = FertilizerUse {
            field_name: Some("A".to_string()),
            fertilizer_name: "8-8-8".to_string(),
            amount: Some(Decimal::from(-3)),
            ..Default::default()
        };
        assert!(Record::validate(&usage).is_err());
    }
}
