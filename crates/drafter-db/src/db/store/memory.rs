//! In-process document store for development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::db::{DocumentStore, Filter};
use crate::error::{DbError, DbResult};

type Collection = BTreeMap<String, Value>;

/// Documents held in memory, grouped by collection and ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a document, returning whether it existed.
    pub async fn remove(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some())
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

fn merge_patch(collection: &str, id: &str, doc: &mut Value, patch: &Value) -> DbResult<()> {
    let (Some(target), Some(source)) = (doc.as_object_mut(), patch.as_object()) else {
        return Err(DbError::MalformedDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: "document and patch must both be JSON objects".to_string(),
        });
    };
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> DbResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: &str, id: &str, doc: Value) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> DbResult<usize> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut matched = 0;
        for (id, doc) in docs.iter_mut().filter(|(_, doc)| filter.matches(doc)) {
            merge_patch(collection, id, doc, &patch)?;
            matched += 1;
        }
        Ok(matched)
    }
}
