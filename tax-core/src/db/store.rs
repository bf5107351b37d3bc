use async_trait::async_trait;
use thiserror::Error;

use super::document::{Document, DocumentId};
use super::filter::{Filter, Projection};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// One named collection of JSON documents.
///
/// Implementations are bound to a collection when created by their
/// [`CollectionFactory`](super::CollectionFactory). Documents handed back by
/// `find` carry the store-assigned id under [`ID_FIELD`](super::ID_FIELD).
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Fully qualified name, `<database>.<collection>`.
    fn namespace(&self) -> &str;

    /// Handle to another collection of the same database, sharing this
    /// handle's connection.
    fn sibling(
        &self,
        collection: &str,
    ) -> Box<dyn DocumentCollection>;

    async fn insert_one(
        &self,
        document: Document,
    ) -> Result<DocumentId, StoreError>;

    /// Inserts every document or none of them.
    async fn insert_many(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<DocumentId>, StoreError>;

    /// Matching documents in insertion order, at most `limit` of them.
    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Merges `patch` into the first matching document. Returns the number
    /// of documents actually changed.
    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError>;

    async fn update_many(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError>;

    async fn delete_one(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError>;

    async fn delete_many(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError>;
}
