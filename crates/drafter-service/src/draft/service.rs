//! Draft operations over the document store.
//!
//! ## Summary
//! Every write is conditional on the status the draft had when it was read.
//! A write that matches nothing re-reads the draft and reports `NotFound` if
//! it vanished or `InvalidState` if its status moved on.

use std::sync::Arc;

use chrono::Utc;

use drafter_core::types::{DraftStatus, DraftType};
use drafter_db::db::DocumentStore;
use drafter_db::db::query::draft as query;
use drafter_db::model::draft::{Draft, DraftPayload, Recipient};

use super::content::ContentResolver;
use super::fields::FieldUpdates;
use super::merge::{ResolvedRecipients, apply_updates};
use super::validate::{Completeness, check_completeness};
use crate::contact::ContactResolver;
use crate::conversation::ConversationTurn;
use crate::delivery::{DeliveryOutcome, DeliveryParams, DeliveryProvider};
use crate::error::{ServiceError, ServiceResult};

/// Whether [`DraftService::create_or_merge`] made a new draft.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Draft),
    Merged(Draft),
}

impl CreateOutcome {
    #[must_use]
    pub fn into_draft(self) -> Draft {
        match self {
            Self::Created(draft) | Self::Merged(draft) => draft,
        }
    }
}

/// ## Summary
/// Parses a draft type name as supplied by callers.
///
/// ## Errors
/// Returns `InvalidArgument` for names other than the supported types.
pub fn parse_draft_type(raw: &str) -> ServiceResult<DraftType> {
    raw.parse::<DraftType>()
        .map_err(|e| ServiceError::InvalidArgument(e.to_string()))
}

pub struct DraftService {
    store: Arc<dyn DocumentStore>,
    contacts: ContactResolver,
    content: Arc<dyn ContentResolver>,
}

impl DraftService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        contacts: ContactResolver,
        content: Arc<dyn ContentResolver>,
    ) -> Self {
        Self {
            store,
            contacts,
            content,
        }
    }

    async fn resolve_list(&self, tokens: Option<&Vec<String>>) -> Option<Vec<Recipient>> {
        match tokens {
            Some(tokens) => Some(self.contacts.resolve_all(tokens).await),
            None => None,
        }
    }

    async fn resolve_recipients(&self, updates: &FieldUpdates, draft_type: DraftType) -> ResolvedRecipients {
        match draft_type {
            DraftType::Email => ResolvedRecipients {
                to: self.resolve_list(updates.to.as_ref()).await,
                cc: self.resolve_list(updates.cc.as_ref()).await,
                bcc: self.resolve_list(updates.bcc.as_ref()).await,
                attendees: None,
            },
            DraftType::CalendarEvent => ResolvedRecipients {
                attendees: self.resolve_list(updates.attendees.as_ref()).await,
                ..ResolvedRecipients::default()
            },
        }
    }

    async fn merge_into(&self, draft: &mut Draft, updates: &FieldUpdates) {
        let foreign = updates.foreign_fields(draft.draft_type());
        if !foreign.is_empty() {
            tracing::info!(
                draft_type = %draft.draft_type(),
                ignored = ?foreign,
                "Ignoring fields that do not apply to this draft type"
            );
        }
        let recipients = self.resolve_recipients(updates, draft.draft_type()).await;
        apply_updates(&mut draft.payload, updates, recipients);
    }

    /// Writes `draft` if the stored copy still has `prior` status.
    async fn persist(&self, draft: Draft, prior: DraftStatus) -> ServiceResult<Draft> {
        if query::replace_if_status(self.store.as_ref(), &draft, prior).await? {
            return Ok(draft);
        }

        match query::by_id(self.store.as_ref(), draft.draft_id).await? {
            None => {
                tracing::warn!("Draft vanished before write");
                Err(ServiceError::draft_not_found(draft.draft_id))
            }
            Some(current) => {
                tracing::warn!(
                    expected = %prior,
                    actual = %current.status,
                    "Draft status changed before write"
                );
                Err(ServiceError::InvalidState {
                    draft_id: draft.draft_id,
                    status: current.status,
                })
            }
        }
    }

    /// ## Summary
    /// Creates an `active` draft owned by `thread_id`.
    ///
    /// Recipient references in `initial` are resolved before the first write.
    ///
    /// ## Errors
    /// Returns `InvalidArgument` for an empty thread id, or a store error.
    #[tracing::instrument(skip(self, initial), fields(draft_type = %draft_type))]
    pub async fn create_draft(
        &self,
        draft_type: DraftType,
        thread_id: &str,
        message_id: &str,
        initial: &FieldUpdates,
    ) -> ServiceResult<Draft> {
        if thread_id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("thread_id must not be empty".to_string()));
        }

        let mut draft = Draft::new(draft_type, thread_id, message_id);
        self.merge_into(&mut draft, initial).await;
        query::insert(self.store.as_ref(), &draft).await?;

        tracing::info!(draft_id = %draft.draft_id, "Draft created");
        Ok(draft)
    }

    /// ## Summary
    /// Merges `fields` into the newest active draft of `draft_type` in the
    /// thread, or creates one when there is none.
    ///
    /// ## Errors
    /// Returns any error from the underlying create or update.
    #[tracing::instrument(skip(self, fields), fields(draft_type = %draft_type))]
    pub async fn create_or_merge(
        &self,
        draft_type: DraftType,
        thread_id: &str,
        message_id: &str,
        fields: &FieldUpdates,
    ) -> ServiceResult<CreateOutcome> {
        let existing = query::active_by_thread(self.store.as_ref(), thread_id, Some(draft_type))
            .await?
            .into_iter()
            .next();

        match existing {
            Some(draft) if fields.is_empty() => Ok(CreateOutcome::Merged(draft)),
            Some(draft) => {
                tracing::debug!(draft_id = %draft.draft_id, "Merging into existing active draft");
                Ok(CreateOutcome::Merged(
                    self.update_draft(draft.draft_id, fields).await?,
                ))
            }
            None => Ok(CreateOutcome::Created(
                self.create_draft(draft_type, thread_id, message_id, fields)
                    .await?,
            )),
        }
    }

    /// ## Errors
    /// Returns `NotFound` when no draft has this id.
    pub async fn get_draft(&self, draft_id: uuid::Uuid) -> ServiceResult<Draft> {
        query::by_id(self.store.as_ref(), draft_id)
            .await?
            .ok_or_else(|| ServiceError::draft_not_found(draft_id))
    }

    /// ## Summary
    /// Fetches a draft only if `thread_id` owns it.
    ///
    /// ## Errors
    /// Returns `NotFound` when the draft is missing or owned by another thread.
    pub async fn get_draft_in_thread(&self, draft_id: uuid::Uuid, thread_id: &str) -> ServiceResult<Draft> {
        let draft = self.get_draft(draft_id).await?;
        if draft.belongs_to(thread_id) {
            Ok(draft)
        } else {
            tracing::debug!(%draft_id, thread_id, "Draft belongs to another thread");
            Err(ServiceError::draft_not_found(draft_id))
        }
    }

    /// ## Errors
    /// Returns a store error.
    pub async fn get_draft_for_message(&self, message_id: &str) -> ServiceResult<Option<Draft>> {
        Ok(query::by_message_id(self.store.as_ref(), message_id).await?)
    }

    /// ## Errors
    /// Returns a store error.
    pub async fn active_drafts(
        &self,
        thread_id: &str,
        draft_type: Option<DraftType>,
    ) -> ServiceResult<Vec<Draft>> {
        Ok(query::active_by_thread(self.store.as_ref(), thread_id, draft_type).await?)
    }

    /// ## Errors
    /// Returns a store error.
    pub async fn thread_drafts(&self, thread_id: &str) -> ServiceResult<Vec<Draft>> {
        Ok(query::all_by_thread(self.store.as_ref(), thread_id).await?)
    }

    /// ## Summary
    /// Applies a partial update.
    ///
    /// A draft in `composio_error` is moved back to `active` and its error
    /// cleared in the same write.
    ///
    /// ## Side Effects
    /// Resolves recipient references against the contact directory.
    ///
    /// ## Errors
    /// Returns `NotFound` if the draft does not exist and `InvalidState` if it
    /// is closed or changed status concurrently.
    #[tracing::instrument(skip(self, updates), fields(draft_id = %draft_id, updated = ?updates.set_fields()))]
    pub async fn update_draft(&self, draft_id: uuid::Uuid, updates: &FieldUpdates) -> ServiceResult<Draft> {
        let mut draft = self.get_draft(draft_id).await?;
        let prior = draft.status;
        if !prior.accepts_updates() {
            return Err(ServiceError::InvalidState {
                draft_id,
                status: prior,
            });
        }

        self.merge_into(&mut draft, updates).await;
        if prior == DraftStatus::ComposioError {
            tracing::info!("Recovering draft from delivery error");
            draft.status = DraftStatus::Active;
            draft.error_message = None;
        }
        draft.updated_at = Utc::now();

        let draft = self.persist(draft, prior).await?;
        tracing::debug!("Draft updated");
        Ok(draft)
    }

    /// ## Errors
    /// Returns `NotFound` if the draft does not exist.
    pub async fn validate_completeness(&self, draft_id: uuid::Uuid) -> ServiceResult<Completeness> {
        Ok(check_completeness(&self.get_draft(draft_id).await?))
    }

    /// ## Errors
    /// Returns `NotFound` if the draft does not exist and `Incomplete` with
    /// the missing fields if it is not ready.
    pub async fn convert_to_delivery_params(&self, draft_id: uuid::Uuid) -> ServiceResult<DeliveryParams> {
        DeliveryParams::from_draft(&self.get_draft(draft_id).await?)
    }

    /// ## Summary
    /// Moves a draft to a terminal status.
    ///
    /// Repeating a close with the draft's current status is a no-op.
    ///
    /// ## Errors
    /// Returns `InvalidArgument` for a non-terminal target, `NotFound` for an
    /// unknown draft and `InvalidState` for `closed` to `composio_error`.
    #[tracing::instrument(skip(self), fields(draft_id = %draft_id, status = %status))]
    pub async fn close_draft(&self, draft_id: uuid::Uuid, status: DraftStatus) -> ServiceResult<Draft> {
        if !status.is_terminal() {
            return Err(ServiceError::InvalidArgument(format!(
                "cannot close a draft as {status}"
            )));
        }

        let mut draft = self.get_draft(draft_id).await?;
        let prior = draft.status;
        if prior == status {
            tracing::debug!("Draft already in requested status");
            return Ok(draft);
        }
        if prior == DraftStatus::Closed {
            return Err(ServiceError::InvalidState {
                draft_id,
                status: prior,
            });
        }

        draft.status = status;
        if status == DraftStatus::Closed {
            draft.error_message = None;
        }
        draft.updated_at = Utc::now();

        let draft = self.persist(draft, prior).await?;
        tracing::info!(from = %prior, "Draft closed");
        Ok(draft)
    }

    /// ## Summary
    /// Proposes values for the draft's missing fields from earlier assistant
    /// turns.
    #[must_use]
    pub fn resolve_content_from_conversation(&self, history: &[ConversationTurn], draft: &Draft) -> FieldUpdates {
        self.content.resolve(history, draft)
    }

    /// ## Summary
    /// Sends a complete draft through `provider`.
    ///
    /// Success closes the draft and, for emails, records the provider's
    /// message id. A provider failure moves the draft to `composio_error`
    /// with the rejection text and is returned as [`DeliveryOutcome::Failed`].
    ///
    /// ## Side Effects
    /// Calls the external provider.
    ///
    /// ## Errors
    /// Returns `NotFound`, `InvalidState` for a closed draft, `Incomplete`
    /// when fields are missing, or a store error.
    #[tracing::instrument(skip(self, provider), fields(draft_id = %draft_id))]
    pub async fn deliver_draft(
        &self,
        draft_id: uuid::Uuid,
        provider: &dyn DeliveryProvider,
    ) -> ServiceResult<DeliveryOutcome> {
        let mut draft = self.get_draft(draft_id).await?;
        let prior = draft.status;
        if prior == DraftStatus::Closed {
            return Err(ServiceError::InvalidState {
                draft_id,
                status: prior,
            });
        }

        let params = DeliveryParams::from_draft(&draft)?;
        let result = provider.deliver(&params).await;
        draft.updated_at = Utc::now();

        match result {
            Ok(receipt) => {
                draft.status = DraftStatus::Closed;
                draft.error_message = None;
                if let DraftPayload::Email(email) = &mut draft.payload {
                    email.sent_message_id.clone_from(&receipt.provider_message_id);
                }
                let draft = self.persist(draft, prior).await?;
                tracing::info!(provider_message_id = ?receipt.provider_message_id, "Draft delivered");
                Ok(DeliveryOutcome::Delivered { draft, receipt })
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(error = %error, "Delivery failed");
                draft.status = DraftStatus::ComposioError;
                draft.error_message = Some(error.clone());
                let draft = self.persist(draft, prior).await?;
                Ok(DeliveryOutcome::Failed { draft, error })
            }
        }
    }
}
