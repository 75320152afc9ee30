//! Structured-inference contracts over an [`Oracle`].
//!
//! ## Summary
//! Every contract degrades instead of failing: a transport error, a reply
//! without a JSON object, or a reply with the wrong shape produces a
//! negative intent or an empty update, logged at `warn`.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value, json};

use drafter_core::types::{DraftType, UpdateCategory};

use super::time::{mentions_clock_time, parse_time};
use super::{Oracle, OracleRequest, PromptKind, json::extract_object};
use crate::conversation::{ConversationTurn, recent};
use crate::draft::fields::{FieldUpdates, ListMode};

const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Result of the creation-intent contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreationIntent {
    pub is_draft_intent: bool,
    pub draft_type: Option<DraftType>,
    pub extracted_fields: FieldUpdates,
}

/// Result of the update-intent contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateIntent {
    pub is_update_intent: bool,
    pub update_category: Option<UpdateCategory>,
    /// Always within `[0, 1]`.
    pub confidence: f32,
}

impl UpdateIntent {
    const fn negative(confidence: f32) -> Self {
        Self {
            is_update_intent: false,
            update_category: None,
            confidence,
        }
    }
}

pub struct OracleAdapter {
    oracle: Arc<dyn Oracle>,
    timezone: Tz,
    history_window: usize,
}

impl OracleAdapter {
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, timezone: Tz, history_window: usize) -> Self {
        Self {
            oracle,
            timezone,
            history_window,
        }
    }

    async fn ask(
        &self,
        prompt_kind: PromptKind,
        user_message: &str,
        history: &[ConversationTurn],
        context: Option<Value>,
    ) -> Option<Map<String, Value>> {
        let request = OracleRequest {
            prompt_kind,
            user_message: user_message.to_string(),
            history: recent(history, self.history_window).to_vec(),
            context,
        };

        let text = match self.oracle.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, kind = prompt_kind.as_str(), "Oracle call failed");
                return None;
            }
        };

        let object = extract_object(&text);
        if object.is_none() {
            tracing::warn!(
                kind = prompt_kind.as_str(),
                response_len = text.len(),
                "Oracle response held no JSON object"
            );
        }
        object
    }

    /// ## Summary
    /// Asks whether the latest message requests a new email or event.
    #[tracing::instrument(skip_all)]
    pub async fn detect_creation_intent(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> CreationIntent {
        let Some(response) = self
            .ask(PromptKind::CreationIntent, user_message, history, None)
            .await
        else {
            return CreationIntent::default();
        };

        let intent = parse_creation_intent(&response, &self.time_context(user_message));
        tracing::debug!(
            is_draft_intent = intent.is_draft_intent,
            draft_type = ?intent.draft_type,
            "Creation intent detected"
        );
        intent
    }

    /// ## Summary
    /// Asks whether the latest message modifies the anchored draft.
    #[tracing::instrument(skip_all)]
    pub async fn detect_update_intent(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        draft_summary: &Value,
    ) -> UpdateIntent {
        let context = json!({ "draft": draft_summary });
        let Some(response) = self
            .ask(PromptKind::UpdateIntent, user_message, history, Some(context))
            .await
        else {
            return UpdateIntent::negative(0.0);
        };

        let intent = parse_update_intent(&response);
        tracing::debug!(
            is_update_intent = intent.is_update_intent,
            category = ?intent.update_category,
            confidence = intent.confidence,
            "Update intent detected"
        );
        intent
    }

    /// ## Summary
    /// Asks which fields of the anchored draft the latest message changes.
    ///
    /// An empty result is normal for the finalization and content-application
    /// categories.
    #[tracing::instrument(skip_all, fields(category = %category))]
    pub async fn extract_field_updates(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        draft_summary: &Value,
        category: UpdateCategory,
    ) -> FieldUpdates {
        let context = json!({ "draft": draft_summary, "update_category": category });
        let Some(response) = self
            .ask(PromptKind::FieldUpdate, user_message, history, Some(context))
            .await
        else {
            return FieldUpdates::default();
        };

        let fields = match response.get("field_updates") {
            Some(Value::Object(fields)) => fields,
            Some(_) => {
                tracing::warn!("field_updates is not an object");
                return FieldUpdates::default();
            }
            None => &response,
        };
        normalize_fields(fields, &self.time_context(user_message))
    }

    /// Times are trusted only when the current message names a clock time.
    /// Clock times in earlier turns may describe unrelated events.
    fn time_context(&self, user_message: &str) -> TimeContext {
        TimeContext::new(self.timezone, mentions_clock_time(user_message))
    }
}

/// What field normalization needs to know about times.
#[derive(Debug, Clone, Copy)]
pub struct TimeContext {
    pub timezone: Tz,
    /// Whether the current user message names a clock time.
    pub user_stated_time: bool,
}

impl TimeContext {
    #[must_use]
    pub const fn new(timezone: Tz, user_stated_time: bool) -> Self {
        Self {
            timezone,
            user_stated_time,
        }
    }
}

fn parse_creation_intent(response: &Map<String, Value>, times: &TimeContext) -> CreationIntent {
    if !response.get("is_draft_intent").and_then(Value::as_bool).unwrap_or(false) {
        return CreationIntent::default();
    }

    let draft_type = match response.get("draft_type").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<DraftType>() {
            Ok(draft_type) => draft_type,
            Err(e) => {
                tracing::warn!(error = %e, "Oracle returned an unknown draft type");
                return CreationIntent::default();
            }
        },
        None => {
            tracing::warn!("Positive creation intent without a draft type");
            return CreationIntent::default();
        }
    };

    let extracted_fields = match response.get("extracted_fields") {
        Some(Value::Object(fields)) => normalize_fields(fields, times),
        _ => FieldUpdates::default(),
    };

    CreationIntent {
        is_draft_intent: true,
        draft_type: Some(draft_type),
        extracted_fields,
    }
}

fn parse_update_intent(response: &Map<String, Value>) -> UpdateIntent {
    #[expect(clippy::cast_possible_truncation, reason = "confidence is clamped to [0, 1]")]
    let confidence = response
        .get("confidence")
        .and_then(Value::as_f64)
        .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0) as f32);

    if !response.get("is_update_intent").and_then(Value::as_bool).unwrap_or(false) {
        return UpdateIntent::negative(confidence);
    }

    match response
        .get("update_category")
        .and_then(Value::as_str)
        .map(str::parse::<UpdateCategory>)
    {
        Some(Ok(category)) => UpdateIntent {
            is_update_intent: true,
            update_category: Some(category),
            confidence,
        },
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Oracle returned an unknown update category");
            UpdateIntent::negative(confidence)
        }
        None => {
            tracing::warn!("Positive update intent without a category");
            UpdateIntent::negative(confidence)
        }
    }
}

fn text_value(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::String(_) | Value::Null => None,
        other => {
            tracing::debug!(key, value = %other, "Dropping non-text field value");
            None
        }
    }
}

/// Flattens a contact value into free-text references for the resolver.
///
/// Accepts a string (see [`split_contacts`]), or a list of strings and
/// `{email, name}` objects.
fn contact_value(key: &str, value: &Value) -> Option<Vec<String>> {
    let tokens: Vec<String> = match value {
        Value::String(s) => split_contacts(s),
        Value::Array(items) => items.iter().filter_map(contact_item).collect(),
        Value::Null => return None,
        other => {
            tracing::debug!(key, value = %other, "Dropping non-list contact value");
            return None;
        }
    };
    (!tokens.is_empty()).then_some(tokens)
}

/// Splits a contact list on `,` and `;` outside `<...>` and `(...)`.
///
/// A bare `Last, First <email>` name is kept whole: a piece without an
/// address is joined to a following piece that carries `<email>`.
fn split_contacts(raw: &str) -> Vec<String> {
    let mut pieces: Vec<(String, bool)> = Vec::new();
    let mut current = String::new();
    let mut depth = 0_usize;
    for c in raw.chars() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 => {
                pieces.push((std::mem::take(&mut current), c == ','));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    pieces.push((current, false));

    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for (piece, comma_after) in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let piece = match pending.take() {
            Some(last_name) if piece.contains('<') => format!("{last_name}, {piece}"),
            Some(last_name) => {
                tokens.push(last_name);
                piece.to_string()
            }
            None => piece.to_string(),
        };
        if comma_after && !piece.contains(['@', '<', '(']) {
            pending = Some(piece);
        } else {
            tokens.push(piece);
        }
    }
    tokens.extend(pending);
    tokens
}

fn contact_item(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(obj) => {
            let field = |k: &str| {
                obj.get(k)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };
            match (field("name"), field("email")) {
                (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
                (None, Some(email)) => Some(email.to_string()),
                (Some(name), None) => Some(name.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

fn time_value(key: &str, value: &Value, times: &TimeContext) -> Option<DateTime<FixedOffset>> {
    let raw = value.as_str()?;
    if !times.user_stated_time {
        tracing::debug!(key, raw, "Discarding time the user never stated");
        return None;
    }
    let parsed = parse_time(raw, times.timezone);
    if parsed.is_none() {
        tracing::debug!(key, raw, "Discarding time without an explicit clock time");
    }
    parsed
}

/// ## Summary
/// Converts an oracle field map into a typed update.
///
/// Unknown keys are ignored and wrong-typed values dropped. Times are kept
/// only when they parse with a clock time and the user stated one.
#[must_use]
pub fn normalize_fields(fields: &Map<String, Value>, times: &TimeContext) -> FieldUpdates {
    let mut updates = FieldUpdates::default();

    for (key, value) in fields {
        match key.as_str() {
            "subject" => updates.subject = text_value(key, value),
            "body" => updates.body = text_value(key, value),
            "title" | "summary" => updates.summary = text_value(key, value),
            "description" => updates.description = text_value(key, value),
            "location" => updates.location = text_value(key, value),
            "to_contacts" | "to_emails" | "to" | "recipients" => {
                updates.to = contact_value(key, value);
            }
            "cc_contacts" | "cc_emails" | "cc" => updates.cc = contact_value(key, value),
            "bcc_contacts" | "bcc_emails" | "bcc" => updates.bcc = contact_value(key, value),
            "attendees" | "attendee_contacts" => updates.attendees = contact_value(key, value),
            "start_time" => updates.start_time = time_value(key, value, times),
            "end_time" => updates.end_time = time_value(key, value, times),
            "replace_recipients" => {
                if value.as_bool() == Some(true) {
                    updates.list_mode = ListMode::Replace;
                }
            }
            other => tracing::debug!(key = other, "Ignoring unknown field"),
        }
    }

    updates
}
