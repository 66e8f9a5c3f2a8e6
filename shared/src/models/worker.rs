//! Worker and group models (organization-scoped)

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::record::Record;
use crate::types::Collection;
use crate::validation::{first_validation_error, require_text, RecordError};

/// A farm worker
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Record for Worker {
    const COLLECTION: Collection = Collection::Workers;

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)
    }
}

/// A working group of workers
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

impl Record for Group {
    const COLLECTION: Collection = Collection::Groups;

    fn validate(&self) -> Result<(), RecordError> {
        Validate::validate(self).map_err(first_validation_error)?;
        require_text("name", &self.name)
    }

    fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.member_ids.retain(|id| seen.insert(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_email_checked() {
        let worker = Worker {
            name: "山田".to_string(),
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        let err = Record::validate(&worker).unwrap_err();
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn test_worker_defaults_to_active() {
        let worker: Worker = serde_json::from_str(r#"{"name":"山田"}"#).unwrap();
        assert!(worker.active);
    }

    #[test]
    fn test_group_dedupes_members() {
        let id = Uuid::new_v4();
        let mut group = Group {
            name: "A班".to_string(),
            member_ids: vec![id, id],
            ..Default::default()
        };
        group.normalize();
        assert_eq!(group.member_ids, vec![id]);
    }
}
