//! The `Record` trait implemented by every stored entity

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};

use crate::types::Collection;
use crate::validation::RecordError;

/// A record type persisted in its own collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the record lives in
    const COLLECTION: Collection;

    /// Designated date used for range queries and ordering
    fn record_date(&self) -> Option<NaiveDate> {
        None
    }

    /// Reject records that fail the entity's rules
    fn validate(&self) -> Result<(), RecordError> {
        Ok(())
    }

    /// Recompute derived, stored values before a write
    fn normalize(&mut self) {}
}
