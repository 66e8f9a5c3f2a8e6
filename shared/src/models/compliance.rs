//! Training and visitor records kept for GAP audits

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::record::Record;
use crate::types::{lenient_date, Collection};
use crate::validation::{first_validation_error, require_text, RecordError};

/// A hygiene or safety training session
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub trainer: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub certificate_issued: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Training {
    const COLLECTION: Collection = Collection::Trainings;

    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("title", &self.title)
    }
}

/// A visitor entering the farm premises
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    #[serde(default, deserialize_with = "lenient_date")]
    pub visit_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub visitor_name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    /// Passed the entry health check (体調確認)
    #[serde(default)]
    pub health_check: bool,
    #[serde(default)]
    pub escorted_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Visitor {
    const COLLECTION: Collection = Collection::Visitors;

    fn record_date(&self) -> Option<NaiveDate> {
        self.visit_date
    }

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("visitorName", &self.visitor_name)
    }
}
