//! In-memory document store for tests and local runs

use std::collections::HashMap;

use async_trait::async_trait;
use shared::Collection;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentQuery, RecordStore, Scope, StoredDocument};
use crate::error::AppResult;

#[derive(Default)]
pub struct MemoryRecordStore {
    documents: RwLock<HashMap<Uuid, StoredDocument>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, doc: StoredDocument) -> AppResult<()> {
        self.documents.write().await.insert(doc.id, doc);
        Ok(())
    }

    async fn replace(&self, doc: StoredDocument, scope: &Scope) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&doc.id) {
            Some(existing) if existing.collection == doc.collection && scope.permits(existing) => {
                existing.data = doc.data;
                existing.record_date = doc.record_date;
                existing.updated_at = doc.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, scope: &Scope, id: Uuid) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        let visible = documents
            .get(&id)
            .is_some_and(|d| d.collection == collection && scope.permits(d));
        if visible {
            documents.remove(&id);
        }
        Ok(visible)
    }

    async fn get(
        &self,
        collection: Collection,
        scope: &Scope,
        id: Uuid,
    ) -> AppResult<Option<StoredDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&id)
            .filter(|d| d.collection == collection && scope.permits(d))
            .cloned())
    }

    async fn list(&self, query: &DocumentQuery) -> AppResult<Vec<StoredDocument>> {
        let documents = self.documents.read().await;
        let mut found: Vec<StoredDocument> = documents
            .values()
            .filter(|d| d.collection == query.collection && query.scope.permits(d))
            .filter(|d| query.matches_date(d.record_date))
            .cloned()
            .collect();

        // record_date DESC NULLS LAST, then newest first
        found.sort_by(|a, b| {
            b.record_date
                .is_some()
                .cmp(&a.record_date.is_some())
                .then(b.record_date.cmp(&a.record_date))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(found)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
