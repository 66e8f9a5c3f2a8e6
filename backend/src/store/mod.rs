//! Document store abstraction
//!
//! Every record type lives in its own collection of JSON documents scoped by
//! owner. Services receive the store as `Arc<dyn RecordStore>` so tests can
//! swap in the in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{Collection, DateRange, Document, Record};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Who is reading or writing: the owner, plus an organization for shared collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub owner_id: String,
    pub organization_id: Option<Uuid>,
}

impl Scope {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            organization_id: None,
        }
    }

    /// Organization access only applies to organization-scoped collections
    pub fn for_collection(&self, collection: Collection) -> Scope {
        Scope {
            owner_id: self.owner_id.clone(),
            organization_id: self
                .organization_id
                .filter(|_| collection.is_organization_scoped()),
        }
    }

    pub fn permits(&self, doc: &StoredDocument) -> bool {
        doc.owner_id == self.owner_id
            || (self.organization_id.is_some() && doc.organization_id == self.organization_id)
    }
}

/// A record as persisted: metadata columns plus the JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub collection: Collection,
    pub owner_id: String,
    pub organization_id: Option<Uuid>,
    pub record_date: Option<NaiveDate>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn from_document<T: Record>(doc: &Document<T>) -> AppResult<Self> {
        let data = serde_json::to_value(&doc.record)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", T::COLLECTION, e)))?;
        Ok(Self {
            id: doc.id,
            collection: T::COLLECTION,
            owner_id: doc.owner_id.clone(),
            organization_id: doc.organization_id,
            record_date: doc.record.record_date(),
            data,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    pub fn into_document<T: Record>(self) -> AppResult<Document<T>> {
        let record = serde_json::from_value(self.data).map_err(|e| {
            AppError::CorruptDocument(format!("{} {}: {}", self.collection, self.id, e))
        })?;
        Ok(Document {
            id: self.id,
            owner_id: self.owner_id,
            organization_id: self.organization_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            record,
        })
    }
}

/// Filter for listing a collection
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub collection: Collection,
    pub scope: Scope,
    /// Inclusive lower bound on the record's designated date
    pub since: Option<NaiveDate>,
    /// Inclusive upper bound on the record's designated date
    pub until: Option<NaiveDate>,
}

impl DocumentQuery {
    pub fn new(collection: Collection, scope: Scope) -> Self {
        Self {
            collection,
            scope,
            since: None,
            until: None,
        }
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.since = Some(range.start);
        self.until = Some(range.end);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Undated documents never match a bounded query
    pub fn matches_date(&self, date: Option<NaiveDate>) -> bool {
        match date {
            None => !self.is_bounded(),
            Some(date) => {
                self.since.map_or(true, |since| date >= since)
                    && self.until.map_or(true, |until| date <= until)
            }
        }
    }
}

/// Persistence for documents. Reads return newest `record_date` first.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, doc: StoredDocument) -> AppResult<()>;

    /// Overwrite body and `updated_at`; false when no visible document has that id
    async fn replace(&self, doc: StoredDocument, scope: &Scope) -> AppResult<bool>;

    /// Hard delete; false when nothing was deleted
    async fn delete(&self, collection: Collection, scope: &Scope, id: Uuid) -> AppResult<bool>;

    async fn get(
        &self,
        collection: Collection,
        scope: &Scope,
        id: Uuid,
    ) -> AppResult<Option<StoredDocument>>;

    async fn list(&self, query: &DocumentQuery) -> AppResult<Vec<StoredDocument>>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> AppResult<()>;
}
