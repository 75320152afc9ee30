#![allow(clippy::unused_async, clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Builds canned oracle replies in the shapes each contract expects and
//! unwraps route outcomes.

use serde_json::{Value, json};

pub use drafter_core::types::{DraftStatus, DraftType, UpdateCategory};
pub use drafter_db::model::draft::{Draft, Recipient};
pub use drafter_service::conversation::ConversationTurn;
pub use drafter_service::delivery::{DeliveryOutcome, DeliveryParams};
pub use drafter_service::draft::FieldUpdates;
pub use drafter_service::error::ServiceError;
pub use drafter_service::oracle::PromptKind;
pub use drafter_service::router::{DraftAction, DraftTurn, RouteOutcome};
pub use drafter_test::{Harness, RecordingDeliveryProvider, ScriptedOracle, anchored_turn, turn};

/// Creation-intent reply for `draft_type` carrying `fields`.
pub fn creation_reply(draft_type: &str, fields: &Value) -> String {
    json!({
        "is_draft_intent": true,
        "draft_type": draft_type,
        "extracted_fields": fields,
    })
    .to_string()
}

pub fn no_creation_reply() -> String {
    json!({ "is_draft_intent": false }).to_string()
}

/// Update-intent reply, fenced the way chat models tend to answer.
pub fn update_reply(category: &str, confidence: f64) -> String {
    format!(
        "```json\n{}\n```",
        json!({
            "is_update_intent": true,
            "update_category": category,
            "confidence": confidence,
        })
    )
}

pub fn field_reply(fields: &Value) -> String {
    json!({ "field_updates": fields }).to_string()
}

/// Unwraps a draft outcome, failing the test on pass-through.
pub fn expect_draft(outcome: RouteOutcome) -> DraftTurn {
    match outcome {
        RouteOutcome::Draft(turn) => turn,
        RouteOutcome::PassThrough => panic!("expected a draft outcome, got pass-through"),
    }
}

pub fn resolved(email: &str, name: &str) -> Recipient {
    Recipient::resolved(email, Some(name.to_string()))
}

/// Email draft for John with a body and no subject, created directly.
pub async fn john_email(harness: &Harness, thread_id: &str) -> Draft {
    let initial = FieldUpdates {
        to: Some(vec!["John".to_string()]),
        body: Some("Let's meet".to_string()),
        ..FieldUpdates::default()
    };
    harness
        .drafts
        .create_draft(DraftType::Email, thread_id, &format!("{thread_id}-m1"), &initial)
        .await
        .expect("draft should be created")
}

/// Adds a subject so [`john_email`] drafts become complete.
pub async fn complete_john_email(harness: &Harness, thread_id: &str) -> Draft {
    let draft = john_email(harness, thread_id).await;
    let subject = FieldUpdates {
        subject: Some("Meeting".to_string()),
        ..FieldUpdates::default()
    };
    harness
        .drafts
        .update_draft(draft.draft_id, &subject)
        .await
        .expect("subject update should succeed")
}
