//! Draft reads and writes on top of a [`DocumentStore`].

use serde_json::Value;

use drafter_core::constants::DRAFT_COLLECTION;
use drafter_core::types::{DraftStatus, DraftType};

use crate::db::{DocumentStore, Filter};
use crate::error::{DbError, DbResult};
use crate::model::draft::Draft;

fn decode(id: &str, doc: Value) -> DbResult<Draft> {
    serde_json::from_value(doc).map_err(|e| DbError::MalformedDocument {
        collection: DRAFT_COLLECTION.to_string(),
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes a result set, skipping documents that no longer parse as drafts.
fn decode_all(docs: Vec<Value>) -> Vec<Draft> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc
                .get("draft_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match decode(&id, doc) {
                Ok(draft) => Some(draft),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed draft document");
                    None
                }
            }
        })
        .collect()
}

fn newest_first(mut drafts: Vec<Draft>) -> Vec<Draft> {
    drafts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.draft_id.cmp(&a.draft_id))
    });
    drafts
}

/// ## Summary
/// Fetches a draft by id.
///
/// ## Errors
/// Returns an error if the store fails or the stored document is malformed.
pub async fn by_id(store: &dyn DocumentStore, draft_id: uuid::Uuid) -> DbResult<Option<Draft>> {
    let id = draft_id.to_string();
    store
        .get(DRAFT_COLLECTION, &id)
        .await?
        .map(|doc| decode(&id, doc))
        .transpose()
}

/// ## Summary
/// Fetches the draft created by the given conversational turn.
///
/// ## Errors
/// Returns an error if the store fails.
pub async fn by_message_id(store: &dyn DocumentStore, message_id: &str) -> DbResult<Option<Draft>> {
    let docs = store
        .find(DRAFT_COLLECTION, &Filter::new().with("message_id", message_id))
        .await?;
    Ok(newest_first(decode_all(docs)).into_iter().next())
}

/// ## Summary
/// Fetches the active drafts owned by `thread_id`, newest first, optionally
/// narrowed to one draft type.
///
/// ## Errors
/// Returns an error if the store fails.
pub async fn active_by_thread(
    store: &dyn DocumentStore,
    thread_id: &str,
    draft_type: Option<DraftType>,
) -> DbResult<Vec<Draft>> {
    let mut filter = Filter::new()
        .with("thread_id", thread_id)
        .with("status", DraftStatus::Active.as_str());
    if let Some(draft_type) = draft_type {
        filter = filter.with("draft_type", draft_type.as_str());
    }
    let docs = store.find(DRAFT_COLLECTION, &filter).await?;
    Ok(newest_first(decode_all(docs)))
}

/// ## Summary
/// Fetches every draft owned by `thread_id` regardless of status, newest first.
///
/// ## Errors
/// Returns an error if the store fails.
pub async fn all_by_thread(store: &dyn DocumentStore, thread_id: &str) -> DbResult<Vec<Draft>> {
    let docs = store
        .find(DRAFT_COLLECTION, &Filter::new().with("thread_id", thread_id))
        .await?;
    Ok(newest_first(decode_all(docs)))
}

/// ## Summary
/// Stores a newly created draft.
///
/// ## Errors
/// Returns an error if serialization or the store write fails.
pub async fn insert(store: &dyn DocumentStore, draft: &Draft) -> DbResult<()> {
    let doc = serde_json::to_value(draft)?;
    store
        .upsert(DRAFT_COLLECTION, &draft.draft_id.to_string(), doc)
        .await
}

/// ## Summary
/// Overwrites a stored draft only if it still exists in `expected_status`.
///
/// Returns `false` when nothing matched, meaning the draft vanished or its
/// status changed since it was read.
///
/// ## Errors
/// Returns an error if serialization or the store write fails.
pub async fn replace_if_status(
    store: &dyn DocumentStore,
    draft: &Draft,
    expected_status: DraftStatus,
) -> DbResult<bool> {
    let filter = Filter::new()
        .with("draft_id", draft.draft_id.to_string())
        .with("thread_id", draft.thread_id.as_str())
        .with("status", expected_status.as_str());
    let patch = serde_json::to_value(draft)?;
    let matched = store.update(DRAFT_COLLECTION, &filter, patch).await?;
    Ok(matched > 0)
}
