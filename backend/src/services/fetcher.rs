//! Date-ranged reads over any record collection

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{DateRange, Document, Record};

use crate::error::AppResult;
use crate::store::{RecordStore, Scope};

use super::RecordService;

/// Fetches an owner's records whose designated date falls in a range
#[derive(Clone)]
pub struct RecordFetcher {
    store: Arc<dyn RecordStore>,
}

impl RecordFetcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Records dated within the inclusive range, newest first
    pub async fn fetch<T: Record>(
        &self,
        scope: &Scope,
        range: DateRange,
    ) -> AppResult<Vec<Document<T>>> {
        let records = RecordService::<T>::new(self.store.clone())
            .list(scope, Some(range))
            .await?;
        tracing::debug!(
            collection = %T::COLLECTION,
            start = %range.start,
            end = %range.end,
            count = records.len(),
            "Fetched records"
        );
        Ok(records)
    }

    /// Records dated on or before `until`, newest first
    pub async fn fetch_until<T: Record>(
        &self,
        scope: &Scope,
        until: NaiveDate,
    ) -> AppResult<Vec<Document<T>>> {
        let records = RecordService::<T>::new(self.store.clone())
            .list_between(scope, None, Some(until))
            .await?;
        tracing::debug!(collection = %T::COLLECTION, %until, count = records.len(), "Fetched records");
        Ok(records)
    }

    /// Records dated on or after `since`, newest first
    pub async fn fetch_since<T: Record>(
        &self,
        scope: &Scope,
        since: NaiveDate,
    ) -> AppResult<Vec<Document<T>>> {
        let records = RecordService::<T>::new(self.store.clone())
            .list_between(scope, Some(since), None)
            .await?;
        tracing::debug!(collection = %T::COLLECTION, %since, count = records.len(), "Fetched records");
        Ok(records)
    }
}
