//! Document store abstraction.
//!
//! Drafts are persisted as JSON documents in named collections. The store is
//! the only shared mutable resource; there are no transactions, and writers
//! race with last-writer-wins semantics per document.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DbResult;

pub mod connection;
pub mod query;
pub mod schema;
pub mod store;

/// Generic document store consumed by the draft layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Value>>;

    /// Fetch every document matching `filter`, ordered by id.
    async fn find(&self, collection: &str, filter: &Filter) -> DbResult<Vec<Value>>;

    /// Insert or fully replace the document stored under `id`.
    async fn upsert(&self, collection: &str, id: &str, doc: Value) -> DbResult<()>;

    /// Merge the top-level keys of `patch` into every document matching
    /// `filter`. Returns the number of documents matched.
    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> DbResult<usize>;
}

/// Top-level field equality filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    fields: Map<String, Value>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Returns true when every filtered field of `doc` equals the expected value.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// The filter as a JSON object, suitable for containment queries.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
