//! PostgreSQL document store backed by a single JSONB table

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::Collection;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentQuery, RecordStore, Scope, StoredDocument};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

/// Database row for a document
#[derive(Debug, Clone, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    collection: String,
    owner_id: String,
    organization_id: Option<Uuid>,
    record_date: Option<NaiveDate>,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for StoredDocument {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let collection = Collection::parse(&row.collection).ok_or_else(|| {
            AppError::CorruptDocument(format!("unknown collection '{}'", row.collection))
        })?;
        Ok(StoredDocument {
            id: row.id,
            collection,
            owner_id: row.owner_id,
            organization_id: row.organization_id,
            record_date: row.record_date,
            data: row.data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, collection, owner_id, organization_id, record_date, \
                              data, created_at, updated_at FROM documents";

// $2 = owner, $3 = organization
const SCOPE_PREDICATE: &str =
    "(owner_id = $2 OR ($3::uuid IS NOT NULL AND organization_id = $3))";

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, doc: StoredDocument) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, owner_id, organization_id, record_date,
                                   data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(doc.id)
        .bind(doc.collection.as_str())
        .bind(&doc.owner_id)
        .bind(doc.organization_id)
        .bind(doc.record_date)
        .bind(&doc.data)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn replace(&self, doc: StoredDocument, scope: &Scope) -> AppResult<bool> {
        let sql = format!(
            "UPDATE documents SET data = $4, record_date = $5, updated_at = $6 \
             WHERE id = $1 AND collection = $7 AND {}",
            SCOPE_PREDICATE
        );
        let result = sqlx::query(&sql)
            .bind(doc.id)
            .bind(&scope.owner_id)
            .bind(scope.organization_id)
            .bind(&doc.data)
            .bind(doc.record_date)
            .bind(doc.updated_at)
            .bind(doc.collection.as_str())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: Collection, scope: &Scope, id: Uuid) -> AppResult<bool> {
        let sql = format!(
            "DELETE FROM documents WHERE id = $1 AND collection = $4 AND {}",
            SCOPE_PREDICATE
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&scope.owner_id)
            .bind(scope.organization_id)
            .bind(collection.as_str())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(
        &self,
        collection: Collection,
        scope: &Scope,
        id: Uuid,
    ) -> AppResult<Option<StoredDocument>> {
        let sql = format!(
            "{} WHERE id = $1 AND collection = $4 AND {}",
            SELECT_COLUMNS, SCOPE_PREDICATE
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .bind(&scope.owner_id)
            .bind(scope.organization_id)
            .bind(collection.as_str())
            .fetch_optional(&self.db)
            .await?;

        row.map(StoredDocument::try_from).transpose()
    }

    async fn list(&self, query: &DocumentQuery) -> AppResult<Vec<StoredDocument>> {
        // Bounds are whole days: since 00:00:00 through until 23:59:59
        let sql = format!(
            "{} WHERE collection = $1 AND {} \
             AND ($4::timestamp IS NULL OR record_date::timestamp >= $4) \
             AND ($5::timestamp IS NULL OR record_date::timestamp <= $5) \
             ORDER BY record_date DESC NULLS LAST, created_at DESC",
            SELECT_COLUMNS, SCOPE_PREDICATE
        );
        let start = query.since.map(|d| d.and_time(NaiveTime::MIN));
        let end = query.until.and_then(|d| d.and_hms_opt(23, 59, 59));

        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(query.collection.as_str())
            .bind(&query.scope.owner_id)
            .bind(query.scope.organization_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(StoredDocument::try_from).collect()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
