//! `PostgreSQL` document store backed by a single JSONB table.
//!
//! Filters use JSONB containment (`@>`) and patches use JSONB concatenation
//! (`||`), which gives the same top-level merge semantics as the in-memory
//! store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Text};
use diesel_async::RunQueryDsl;
use serde_json::Value;

use crate::db::connection::DbPool;
use crate::db::schema::document;
use crate::db::{DocumentStore, Filter};
use crate::error::DbResult;

#[derive(Debug, QueryableByName)]
struct BodyRow {
    #[diesel(sql_type = Jsonb)]
    body: Value,
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Value>> {
        let mut conn = self.pool.get().await?;
        let body = document::table
            .filter(document::collection.eq(collection))
            .filter(document::id.eq(id))
            .select(document::body)
            .first::<Value>(&mut conn)
            .await
            .optional()?;
        Ok(body)
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, collection: &str, filter: &Filter) -> DbResult<Vec<Value>> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::sql_query(
            "SELECT body FROM document WHERE collection = $1 AND body @> $2 ORDER BY id",
        )
        .bind::<Text, _>(collection)
        .bind::<Jsonb, _>(filter.to_json())
        .load::<BodyRow>(&mut conn)
        .await?;

        tracing::trace!(count = rows.len(), "Loaded documents");
        Ok(rows.into_iter().map(|row| row.body).collect())
    }

    #[tracing::instrument(skip(self, doc))]
    async fn upsert(&self, collection: &str, id: &str, doc: Value) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        diesel::sql_query(
            "INSERT INTO document (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
        )
        .bind::<Text, _>(collection)
        .bind::<Text, _>(id)
        .bind::<Jsonb, _>(doc)
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> DbResult<usize> {
        let mut conn = self.pool.get().await?;
        let matched = diesel::sql_query(
            "UPDATE document SET body = body || $3, updated_at = now() \
             WHERE collection = $1 AND body @> $2",
        )
        .bind::<Text, _>(collection)
        .bind::<Jsonb, _>(filter.to_json())
        .bind::<Jsonb, _>(patch)
        .execute(&mut conn)
        .await?;

        tracing::trace!(matched, "Patched documents");
        Ok(matched)
    }
}
