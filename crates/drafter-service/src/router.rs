//! Per-turn routing between draft handling and pass-through.
//!
//! ## Summary
//! A turn anchored to one of the thread's open drafts is checked for an
//! update intent; any other turn is checked for a creation intent. Turns
//! with neither, and turns where anything fails, pass through untouched so
//! the caller can continue with normal tool dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use drafter_core::constants::ANCHOR_TYPE_DRAFT;
use drafter_core::types::{DraftStatus, UpdateCategory};
use drafter_db::model::draft::Draft;

use crate::conversation::ConversationTurn;
use crate::draft::service::{CreateOutcome, DraftService};
use crate::draft::summary::summarize;
use crate::draft::validate::{Completeness, check_completeness};
use crate::error::ServiceResult;
use crate::oracle::OracleAdapter;

/// Item the user is looking at or replying to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredItem {
    pub item_type: String,
    pub item_id: String,
    /// Client-side copy of the item. Never trusted for drafts.
    #[serde(default)]
    pub snapshot: Option<Value>,
}

/// One inbound user message with its conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub thread_id: String,
    pub message_id: String,
    pub user_message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub anchor: Option<AnchoredItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "category", rename_all = "snake_case")]
pub enum DraftAction {
    Created,
    Merged,
    Updated(UpdateCategory),
    /// An update intent was recognised but nothing needed to change.
    Acknowledged(UpdateCategory),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftTurn {
    pub action: DraftAction,
    pub draft: Draft,
    pub completeness: Completeness,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RouteOutcome {
    /// Not a draft turn; continue with normal handling.
    PassThrough,
    Draft(DraftTurn),
}

enum Anchor {
    /// An open draft owned by the turn's thread.
    Draft(Draft),
    /// A draft the turn may not touch.
    Rejected,
    None,
}

pub struct ConversationRouter {
    drafts: Arc<DraftService>,
    oracle: OracleAdapter,
    confidence_threshold: f32,
}

impl ConversationRouter {
    #[must_use]
    pub fn new(drafts: Arc<DraftService>, oracle: OracleAdapter, confidence_threshold: f32) -> Self {
        Self {
            drafts,
            oracle,
            confidence_threshold,
        }
    }

    #[must_use]
    pub fn drafts(&self) -> &DraftService {
        &self.drafts
    }

    /// ## Summary
    /// Handles one turn. Never fails: errors are logged and the turn passes
    /// through.
    #[tracing::instrument(skip_all, fields(thread_id = %turn.thread_id, message_id = %turn.message_id))]
    pub async fn route(&self, turn: &Turn) -> RouteOutcome {
        match self.try_route(turn).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Draft handling failed; passing turn through");
                RouteOutcome::PassThrough
            }
        }
    }

    async fn try_route(&self, turn: &Turn) -> ServiceResult<RouteOutcome> {
        match self.resolve_anchor(turn).await? {
            Anchor::Draft(draft) => self.handle_update(turn, draft).await,
            Anchor::Rejected => Ok(RouteOutcome::PassThrough),
            Anchor::None => self.handle_creation(turn).await,
        }
    }

    /// Reloads the anchored draft from the store; the snapshot is ignored.
    async fn resolve_anchor(&self, turn: &Turn) -> ServiceResult<Anchor> {
        let Some(anchor) = turn
            .anchor
            .as_ref()
            .filter(|a| a.item_type == ANCHOR_TYPE_DRAFT)
        else {
            return Ok(Anchor::None);
        };

        let Ok(draft_id) = anchor.item_id.parse::<uuid::Uuid>() else {
            tracing::warn!(item_id = %anchor.item_id, "Anchored draft id is not a UUID");
            return Ok(Anchor::Rejected);
        };

        let draft = self.drafts.get_draft(draft_id).await?;
        if !draft.belongs_to(&turn.thread_id) {
            tracing::warn!(%draft_id, owner = %draft.thread_id, "Ignoring draft anchored from another thread");
            return Ok(Anchor::Rejected);
        }
        if draft.status == DraftStatus::Closed {
            tracing::debug!(%draft_id, "Anchored draft is closed; treating turn as unanchored");
            return Ok(Anchor::None);
        }
        Ok(Anchor::Draft(draft))
    }

    async fn handle_update(&self, turn: &Turn, draft: Draft) -> ServiceResult<RouteOutcome> {
        let summary = summarize(&draft);
        let intent = self
            .oracle
            .detect_update_intent(&turn.user_message, &turn.history, &summary)
            .await;

        let Some(category) = intent.update_category.filter(|_| intent.is_update_intent) else {
            return Ok(RouteOutcome::PassThrough);
        };
        if intent.confidence < self.confidence_threshold {
            tracing::debug!(
                confidence = intent.confidence,
                threshold = self.confidence_threshold,
                "Update intent below confidence threshold"
            );
            return Ok(RouteOutcome::PassThrough);
        }

        let updates = if category.uses_conversation_content() {
            self.drafts
                .resolve_content_from_conversation(&turn.history, &draft)
        } else {
            self.oracle
                .extract_field_updates(&turn.user_message, &turn.history, &summary, category)
                .await
        };

        if updates.is_empty() {
            tracing::debug!(%category, "No field changes; acknowledging");
            return Ok(draft_turn(DraftAction::Acknowledged(category), draft));
        }

        let updated = self.drafts.update_draft(draft.draft_id, &updates).await?;
        Ok(draft_turn(DraftAction::Updated(category), updated))
    }

    async fn handle_creation(&self, turn: &Turn) -> ServiceResult<RouteOutcome> {
        let intent = self
            .oracle
            .detect_creation_intent(&turn.user_message, &turn.history)
            .await;
        let Some(draft_type) = intent.draft_type.filter(|_| intent.is_draft_intent) else {
            return Ok(RouteOutcome::PassThrough);
        };

        let outcome = self
            .drafts
            .create_or_merge(
                draft_type,
                &turn.thread_id,
                &turn.message_id,
                &intent.extracted_fields,
            )
            .await?;

        Ok(match outcome {
            CreateOutcome::Created(draft) => draft_turn(DraftAction::Created, draft),
            CreateOutcome::Merged(draft) => draft_turn(DraftAction::Merged, draft),
        })
    }
}

fn draft_turn(action: DraftAction, draft: Draft) -> RouteOutcome {
    let completeness = check_completeness(&draft);
    RouteOutcome::Draft(DraftTurn {
        action,
        draft,
        completeness,
    })
}
