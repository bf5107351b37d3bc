//! Process-local backend keeping documents in memory.
//!
//! Filters are evaluated with [`Filter::matches`]. Everything is lost when
//! the last handle is dropped, so this backend suits demos and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::document::{self, Document, DocumentId, ID_FIELD};
use super::factory::{CollectionFactory, DbConfig, database_of, namespace};
use super::filter::{Filter, Projection};
use super::store::{DocumentCollection, StoreError};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    collections: HashMap<String, Vec<(DocumentId, Document)>>,
}

/// In-memory [`DocumentCollection`]. Siblings share one id sequence.
#[derive(Clone)]
pub struct MemoryCollection {
    namespace: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCollection {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }

    fn update(
        &self,
        filter: &Filter,
        patch: &Document,
        first_only: bool,
    ) -> Result<u64, StoreError> {
        filter.validate()?;
        document::check_patch(patch)?;

        let mut state = self.lock()?;
        let Some(docs) = state.collections.get_mut(&self.namespace) else {
            return Ok(0);
        };
        let mut modified = 0;
        for (id, doc) in docs.iter_mut() {
            if !filter.matches(&with_id(*id, doc)) {
                continue;
            }
            if document::merge_patch(doc, patch) {
                modified += 1;
            }
            if first_only {
                break;
            }
        }
        Ok(modified)
    }

    fn delete(
        &self,
        filter: &Filter,
        first_only: bool,
    ) -> Result<u64, StoreError> {
        filter.validate()?;

        let mut state = self.lock()?;
        let Some(docs) = state.collections.get_mut(&self.namespace) else {
            return Ok(0);
        };
        let before = docs.len();
        let mut deleted_one = false;
        docs.retain(|(id, doc)| {
            if first_only && deleted_one {
                return true;
            }
            let hit = filter.matches(&with_id(*id, doc));
            deleted_one |= hit;
            !hit
        });
        Ok((before - docs.len()) as u64)
    }
}

fn with_id(
    id: DocumentId,
    doc: &Document,
) -> Document {
    let mut doc = doc.clone();
    doc.insert(ID_FIELD.to_string(), Value::from(id.0));
    doc
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn sibling(
        &self,
        collection: &str,
    ) -> Box<dyn DocumentCollection> {
        Box::new(MemoryCollection {
            namespace: namespace(database_of(&self.namespace), collection),
            state: Arc::clone(&self.state),
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
        for doc in &documents {
            document::check_insertable(doc)?;
        }

        let mut state = self.lock()?;
        let mut ids = Vec::with_capacity(documents.len());
        let mut rows = Vec::with_capacity(documents.len());
        for doc in documents {
            state.last_id += 1;
            let id = DocumentId(state.last_id);
            ids.push(id);
            rows.push((id, doc));
        }
        state
            .collections
            .entry(self.namespace.clone())
            .or_default()
            .extend(rows);
        Ok(ids)
    }

    async fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        filter.validate()?;

        let state = self.lock()?;
        let Some(docs) = state.collections.get(&self.namespace) else {
            return Ok(Vec::new());
        };
        let found = docs
            .iter()
            .map(|(id, doc)| with_id(*id, doc))
            .filter(|doc| filter.matches(doc))
            .take(limit.unwrap_or(usize::MAX))
            .map(|doc| match projection {
                Some(p) => p.apply(doc),
                None => doc,
            })
            .collect();
        Ok(found)
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        self.update(filter, patch, true)
    }

    async fn update_many(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        self.update(filter, patch, false)
    }

    async fn delete_one(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        self.delete(filter, true)
    }

    async fn delete_many(
        &self,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        self.delete(filter, false)
    }
}

/// [`CollectionFactory`] for the `"memory"` backend.
pub struct MemoryCollectionFactory;

#[async_trait]
impl CollectionFactory for MemoryCollectionFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DocumentCollection>, StoreError> {
        Ok(Box::new(MemoryCollection::new(&config.namespace())))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::db::Condition;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    async fn seeded() -> MemoryCollection {
        let people = MemoryCollection::new("taxes.people");
        people
            .insert_many(vec![
                doc(json!({"name": "Ona", "age": 25})),
                doc(json!({"name": "Jonas", "age": 40})),
                doc(json!({"name": "Rasa", "age": 25})),
            ])
            .await
            .unwrap();
        people
    }

    fn names(docs: &[Document]) -> Vec<&str> {
        docs.iter()
            .map(|d| d["name"].as_str().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let people = MemoryCollection::new("taxes.people");

        let first = people.insert_one(doc(json!({"name": "A"}))).await.unwrap();
        let second = people.insert_one(doc(json!({"name": "B"}))).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn find_returns_matches_in_insertion_order_with_ids() {
        let people = seeded().await;

        let found = people
            .find(&Filter::new("age", Condition::Equal(json!(25))), None, None)
            .await
            .unwrap();

        assert_eq!(names(&found), vec!["Ona", "Rasa"]);
        assert_eq!(DocumentId::of(&found[0]), Some(DocumentId(1)));
    }

    #[tokio::test]
    async fn find_honours_limit_and_projection() {
        let people = seeded().await;

        let found = people
            .find(&Filter::all(), Some(&Projection::without_id()), Some(2))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| !d.contains_key(ID_FIELD)));
    }

    #[tokio::test]
    async fn update_one_touches_first_match_only() {
        let people = seeded().await;
        let by_age = Filter::new("age", Condition::Equal(json!(25)));

        let modified = people
            .update_one(&by_age, &doc(json!({"age": 26})))
            .await
            .unwrap();

        assert_eq!(modified, 1);
        let still_25 = people.find(&by_age, None, None).await.unwrap();
        assert_eq!(names(&still_25), vec!["Rasa"]);
    }

    #[tokio::test]
    async fn delete_many_by_id_filter() {
        let people = seeded().await;

        let deleted = people
            .delete_many(&Filter::new("_id", Condition::In(vec![json!(1), json!(3)])))
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        let left = people.find(&Filter::all(), None, None).await.unwrap();
        assert_eq!(names(&left), vec!["Jonas"]);
    }

    #[tokio::test]
    async fn delete_one_stops_after_first_match() {
        let people = seeded().await;

        let deleted = people
            .delete_one(&Filter::new("age", Condition::Equal(json!(25))))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        let left = people.find(&Filter::all(), None, None).await.unwrap();
        assert_eq!(names(&left), vec!["Jonas", "Rasa"]);
    }

    #[tokio::test]
    async fn sibling_shares_state_but_not_documents() {
        let people = seeded().await;
        let cards = people.sibling("tax_cards");

        let id = cards.insert_one(doc(json!({"tax_paid": 1.0}))).await.unwrap();

        assert_eq!(cards.namespace(), "taxes.tax_cards");
        assert_eq!(id, DocumentId(4));
        assert_eq!(people.find(&Filter::all(), None, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_key_is_rejected() {
        let people = seeded().await;

        let result = people
            .find(&Filter::new("a b", Condition::Equal(json!(1))), None, None)
            .await;

        assert!(matches!(result, Err(StoreError::InvalidFilter(_))));
    }
}
