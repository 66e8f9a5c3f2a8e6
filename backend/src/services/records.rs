//! Generic CRUD service shared by every record collection

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use shared::{DateRange, Document, Record};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{DocumentQuery, RecordStore, Scope, StoredDocument};

/// Create, read, update and delete documents of one record type
pub struct RecordService<T> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordService<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn scope(scope: &Scope) -> Scope {
        scope.for_collection(T::COLLECTION)
    }

    /// List documents, newest designated date first
    pub async fn list(
        &self,
        scope: &Scope,
        date_range: Option<DateRange>,
    ) -> AppResult<Vec<Document<T>>> {
        let mut query = DocumentQuery::new(T::COLLECTION, Self::scope(scope));
        if let Some(range) = date_range {
            query = query.within(range);
        }
        self.run(query).await
    }

    /// List documents dated within optional inclusive bounds
    pub async fn list_between(
        &self,
        scope: &Scope,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> AppResult<Vec<Document<T>>> {
        let mut query = DocumentQuery::new(T::COLLECTION, Self::scope(scope));
        query.since = since;
        query.until = until;
        self.run(query).await
    }

    async fn run(&self, query: DocumentQuery) -> AppResult<Vec<Document<T>>> {
        self.store
            .list(&query)
            .await?
            .into_iter()
            .map(StoredDocument::into_document)
            .collect()
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> AppResult<Document<T>> {
        self.store
            .get(T::COLLECTION, &Self::scope(scope), id)
            .await?
            .ok_or_else(|| AppError::NotFound(T::COLLECTION.to_string()))?
            .into_document()
    }

    /// Validate, derive stored values and insert a new document
    pub async fn create(&self, scope: &Scope, mut record: T) -> AppResult<Document<T>> {
        record.normalize();
        record.validate()?;

        let mut doc = Document::new(scope.owner_id.clone(), record);
        doc.organization_id = Self::scope(scope).organization_id;

        self.store.insert(StoredDocument::from_document(&doc)?).await?;
        tracing::debug!(collection = %T::COLLECTION, id = %doc.id, "Created record");
        Ok(doc)
    }

    /// Replace the record body of an existing document
    pub async fn update(&self, scope: &Scope, id: Uuid, mut record: T) -> AppResult<Document<T>> {
        record.normalize();
        record.validate()?;

        let mut doc = self.get(scope, id).await?;
        doc.record = record;
        doc.updated_at = Utc::now();

        let replaced = self
            .store
            .replace(StoredDocument::from_document(&doc)?, &Self::scope(scope))
            .await?;
        if !replaced {
            return Err(AppError::NotFound(T::COLLECTION.to_string()));
        }
        Ok(doc)
    }

    /// Hard delete
    pub async fn delete(&self, scope: &Scope, id: Uuid) -> AppResult<()> {
        if self.store.delete(T::COLLECTION, &Self::scope(scope), id).await? {
            tracing::debug!(collection = %T::COLLECTION, id = %id, "Deleted record");
            Ok(())
        } else {
            Err(AppError::NotFound(T::COLLECTION.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use rust_decimal::Decimal;
    use shared::{Field, Harvest, Worker};

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn service<T: Record>(store: &Arc<dyn RecordStore>) -> RecordService<T> {
        RecordService::new(store.clone())
    }

    fn harvest(quantity: i64, disposal: i64) -> Harvest {
        Harvest {
            field_name: Some("North".to_string()),
            crop_name: "Tomato".to_string(),
            harvest_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            quantity: dec(quantity),
            disposal_amount: dec(disposal),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_disposal_rate() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let created = service::<Harvest>(&store)
            .create(&Scope::owner("alice"), harvest(80, 20))
            .await
            .unwrap();
        assert_eq!(created.record.disposal_rate, dec(20));
        assert_eq!(created.record.total_amount, dec(100));

        let fetched = service::<Harvest>(&store)
            .get(&Scope::owner("alice"), created.id)
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let err = service::<Field>(&store)
            .create(&Scope::owner("alice"), Field::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_owner() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let svc = service::<Harvest>(&store);
        let scope = Scope::owner("alice");
        let created = svc.create(&scope, harvest(10, 0)).await.unwrap();

        let updated = svc.update(&scope, created.id, harvest(2, 1)).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.owner_id, "alice");
        assert_eq!(updated.record.disposal_rate.to_string(), "33.3");

        let other = svc.update(&Scope::owner("bob"), created.id, harvest(1, 0)).await;
        assert!(matches!(other, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let svc = service::<Harvest>(&store);
        let scope = Scope::owner("alice");
        let created = svc.create(&scope, harvest(10, 0)).await.unwrap();

        svc.delete(&scope, created.id).await.unwrap();
        assert!(matches!(svc.get(&scope, created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete(&scope, created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_workers_are_shared_within_organization() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let svc = service::<Worker>(&store);
        let org = Uuid::new_v4();
        let alice = Scope {
            owner_id: "alice".to_string(),
            organization_id: Some(org),
        };
        let bob = Scope {
            owner_id: "bob".to_string(),
            organization_id: Some(org),
        };

        let worker = Worker {
            name: "Sato".to_string(),
            active: true,
            ..Default::default()
        };
        svc.create(&alice, worker).await.unwrap();
        assert_eq!(svc.list(&bob, None).await.unwrap().len(), 1);

        // Harvests stay private even inside the organization
        let harvests = service::<Harvest>(&store);
        harvests.create(&alice, harvest(1, 0)).await.unwrap();
        assert!(harvests.list(&bob, None).await.unwrap().is_empty());
    }
}
