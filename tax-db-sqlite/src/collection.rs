use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tax_core::db::document::{check_insertable, check_patch, merge_patch};
use tax_core::db::factory::{database_of, namespace};
use tax_core::db::{Document, DocumentCollection, DocumentId, Filter, ID_FIELD, Projection};
use tax_core::StoreError;
use tracing::debug;

use crate::query::push_where;

/// A [`DocumentCollection`] stored in SQLite.
///
/// All collections share one `documents` table; each handle only sees rows
/// of its own namespace. The pool holds a single connection.
#[derive(Clone)]
pub struct SqliteCollection {
    pool: SqlitePool,
    namespace: String,
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteCollection {
    /// Opens `database_url` (a sqlx URL such as `sqlite:taxes.db?mode=rwc`).
    pub async fn connect(
        database_url: &str,
        namespace: &str,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("failed to open '{database_url}': {e}"))
            })?;
        debug!(database_url, namespace, "sqlite connection open");
        Ok(Self::new_with_pool(pool, namespace))
    }

    pub fn new_with_pool(
        pool: SqlitePool,
        namespace: &str,
    ) -> Self {
        Self {
            pool,
            namespace: namespace.to_string(),
        }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to run migrations: {e}")))
    }

    async fn select(
        &self,
        conn: &mut SqliteConnection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<(DocumentId, Document)>, StoreError> {
        filter.validate()?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, body FROM documents");
        push_where(&mut qb, &self.namespace, filter);
        qb.push(" ORDER BY id");
        if let Some(limit) = limit {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build().fetch_all(&mut *conn).await.map_err(db_err)?;
        rows.iter().map(decode_row).collect()
    }

    async fn update(
        &self,
        filter: &Filter,
        patch: &Document,
        first_only: bool,
    ) -> Result<u64, StoreError> {
        check_patch(patch)?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let limit = if first_only { Some(1) } else { None };
        let matched = self.select(&mut tx, filter, limit).await?;

        let mut modified = 0;
        for (id, mut body) in matched {
            if !merge_patch(&mut body, patch) {
                continue;
            }
            sqlx::query("UPDATE documents SET body = ? WHERE id = ?")
                .bind(serde_json::to_string(&body)?)
                .bind(id.0)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            modified += 1;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(modified)
    }

    async fn delete(
        &self,
        filter: &Filter,
        first_only: bool,
    ) -> Result<u64, StoreError> {
        filter.validate()?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "DELETE FROM documents WHERE id IN (SELECT id FROM documents",
        );
        push_where(&mut qb, &self.namespace, filter);
        qb.push(" ORDER BY id");
        if first_only {
            qb.push(" LIMIT 1");
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

/// Decodes a `(id, body)` row; the returned body does not contain `_id`.
fn decode_row(row: &SqliteRow) -> Result<(DocumentId, Document), StoreError> {
    let id: i64 = row.try_get("id").map_err(db_err)?;
    let body: String = row.try_get("body").map_err(db_err)?;
    let doc: Document = serde_json::from_str(&body)?;
    Ok((DocumentId(id), doc))
}

#[async_trait]
impl DocumentCollection for SqliteCollection {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn sibling(
        &self,
        collection: &str,
    ) -> Box<dyn DocumentCollection> {
        Box::new(SqliteCollection {
            pool: self.pool.clone(),
            namespace: namespace(database_of(&self.namespace), collection),
        })
    }

    async fn insert_one(
        &self,
        document: Document,
    ) -> Result<DocumentId, StoreError> {
        let mut ids = self.insert_many(vec![document]).await?;
        ids.pop()
            .ok_or_else(|| StoreError::Database("insert produced no id".to_string()))
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        let mut bodies = Vec::with_capacity(documents.len());
        for doc in &documents {
            check_insertable(doc)?;
            bodies.push(serde_json::to_string(doc)?);
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut ids = Vec::with_capacity(bodies.len());
        for body in bodies {
            let result = sqlx::query("INSERT INTO documents (namespace, body) VALUES (?, ?)")
                .bind(&self.namespace)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            ids.push(DocumentId(result.last_insert_rowid()));
        }
        tx.commit().await.map_err(db_err)?;

        debug!(namespace = %self.namespace, count = ids.len(), "inserted documents");
        Ok(ids)
    }

    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let rows = self.select(&mut conn, filter, limit).await?;

        Ok(rows
            .into_iter()
            .map(|(id, mut doc)| {
                doc.insert(ID_FIELD.to_string(), Value::from(id.0));
                match projection {
                    Some(p) => p.apply(doc),
                    None => doc,
                }
            })
            .collect())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        self.update(filter, patch, true).await
    }

    async fn update_many(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        self.update(filter, patch, false).await
    }

    async fn delete_one(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        self.delete(filter, true).await
    }

    async fn delete_many(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        self.delete(filter, false).await
    }
}
