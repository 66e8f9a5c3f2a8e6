//! Farm field models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::record::Record;
use crate::types::Collection;
use crate::validation::{first_validation_error, require_non_negative_opt, require_text, RecordError};

/// A cultivated field (圃場)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Area in square metres
    #[serde(default)]
    pub area: Option<Decimal>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub current_crop: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Field {
    const COLLECTION: Collection = Collection::Fields;

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)?;
        require_non_negative_opt("area", self.area)
    }
}

/// How a record refers to a field: by document id, by name, or both.
///
/// Records are correlated without foreign keys, so matching is a two-tier
/// lookup: when both sides carry an id the ids decide, otherwise the
/// trimmed names must be equal and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    pub id: Option<Uuid>,
    pub name: Option<&'a str>,
}

impl<'a> FieldRef<'a> {
    pub fn new(id: Option<Uuid>, name: Option<&'a str>) -> Self {
        Self { id, name }
    }

    pub fn matches(&self, other: &FieldRef<'_>) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        match (self.normalized_name(), other.normalized_name()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Display key for grouping; id is used only when no name exists
    pub fn display_name(&self) -> String {
        match (self.normalized_name(), self.id) {
            (Some(name), _) => name.to_string(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "(未設定)".to_string(),
        }
    }

    fn normalized_name(&self) -> Option<&'a str> {
        self.name.map(str::trim).filter(|n| !n.is_empty())
    }
}
