//! Typed façade over one [`DocumentCollection`].
//!
//! Every operation logs failures at this boundary and returns them as
//! values: writes as `Result`, reads as a [`QueryOutcome`] that keeps "no
//! matches" apart from "query failed".

use serde_json::Value;
use tracing::{debug, error};

use super::document::{Document, DocumentId};
use super::factory::{DbConfig, StoreRegistry};
use super::filter::{Condition, Filter, Projection};
use super::store::{DocumentCollection, StoreError};

/// Most documents [`RecordStoreClient::find_between`] ever returns.
pub const RANGE_QUERY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found(Vec<Document>),
    Empty,
    Failed(StoreError),
}

impl QueryOutcome {
    fn from_result(result: Result<Vec<Document>, StoreError>) -> Self {
        match result {
            Ok(docs) if docs.is_empty() => QueryOutcome::Empty,
            Ok(docs) => QueryOutcome::Found(docs),
            Err(err) => QueryOutcome::Failed(err),
        }
    }

    /// Matched documents; empty for `Empty` and `Failed`.
    pub fn documents(&self) -> &[Document] {
        match self {
            QueryOutcome::Found(docs) => docs,
            QueryOutcome::Empty | QueryOutcome::Failed(_) => &[],
        }
    }

    pub fn into_documents(self) -> Vec<Document> {
        match self {
            QueryOutcome::Found(docs) => docs,
            QueryOutcome::Empty | QueryOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }
}

/// CRUD and comparison queries against one collection.
pub struct RecordStoreClient {
    collection: Box<dyn DocumentCollection>,
}

impl RecordStoreClient {
    pub fn new(collection: Box<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    /// Opens the collection named by `config` through `registry`.
    ///
    /// # Errors
    /// Fails when the backend is unknown or cannot be reached; the client
    /// is unusable in that case.
    pub async fn connect(
        registry: &StoreRegistry,
        config: &DbConfig,
    ) -> Result<Self, StoreError> {
        debug!(backend = %config.backend, namespace = %config.namespace(), "connecting");
        let collection = registry.create(config).await?;
        Ok(Self::new(collection))
    }

    pub fn namespace(&self) -> &str {
        self.collection.namespace()
    }

    /// Client for another collection of the same database, on the same
    /// connection.
    pub fn sibling(
        &self,
        collection: &str,
    ) -> RecordStoreClient {
        RecordStoreClient::new(self.collection.sibling(collection))
    }

    fn report<T>(
        &self,
        operation: &'static str,
        result: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if let Err(ref err) = result {
            error!(namespace = %self.namespace(), operation, error = %err, "store operation failed");
        }
        result
    }

    pub async fn insert_one(
        &self,
        document: Document,
    ) -> Result<DocumentId, StoreError> {
        let result = self.collection.insert_one(document).await;
        self.report("insert_one", result)
    }

    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        let result = self.collection.insert_many(documents).await;
        self.report("insert_many", result)
    }

    pub async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        let result = self.collection.update_one(filter, patch).await;
        self.report("update_one", result)
    }

    pub async fn update_many(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        let result = self.collection.update_many(filter, patch).await;
        self.report("update_many", result)
    }

    pub async fn delete_one(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let result = self.collection.delete_one(filter).await;
        self.report("delete_one", result)
    }

    pub async fn delete_many(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let result = self.collection.delete_many(filter).await;
        self.report("delete_many", result)
    }

    /// All documents matching `filter`.
    pub async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_limited(filter, projection, None).await
    }

    async fn find_limited(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: Option<usize>,
    ) -> QueryOutcome {
        debug!(namespace = %self.namespace(), %filter, ?limit, "find");
        let result = self
            .collection
            .find(filter, projection, limit)
            .await
            .map(|mut docs| {
                if let Some(limit) = limit {
                    docs.truncate(limit);
                }
                docs
            });
        QueryOutcome::from_result(self.report("find", result))
    }

    async fn find_one_clause(
        &self,
        key: &str,
        condition: Condition,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find(&Filter::new(key, condition), projection).await
    }

    pub async fn find_equal(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::Equal(value.into()), projection)
            .await
    }

    pub async fn find_not_equal(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::NotEqual(value.into()), projection)
            .await
    }

    pub async fn find_greater_than(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::GreaterThan(value.into()), projection)
            .await
    }

    pub async fn find_greater_or_equal(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::GreaterOrEqual(value.into()), projection)
            .await
    }

    pub async fn find_less_than(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::LessThan(value.into()), projection)
            .await
    }

    pub async fn find_less_or_equal(
        &self,
        key: &str,
        value: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        self.find_one_clause(key, Condition::LessOrEqual(value.into()), projection)
            .await
    }

    pub async fn find_in<I, V>(
        &self,
        key: &str,
        values: I,
        projection: Option<&Projection>,
    ) -> QueryOutcome
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.find_one_clause(key, Condition::In(values), projection)
            .await
    }

    pub async fn find_not_in<I, V>(
        &self,
        key: &str,
        values: I,
        projection: Option<&Projection>,
    ) -> QueryOutcome
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.find_one_clause(key, Condition::NotIn(values), projection)
            .await
    }

    /// Documents with `min <= key <= max`, never more than
    /// [`RANGE_QUERY_LIMIT`] of them.
    pub async fn find_between(
        &self,
        key: &str,
        min: impl Into<Value>,
        max: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> QueryOutcome {
        let filter = Filter::new(
            key,
            Condition::Between {
                min: min.into(),
                max: max.into(),
            },
        );
        self.find_limited(&filter, projection, Some(RANGE_QUERY_LIMIT))
            .await
    }
}
