#![allow(clippy::unused_async, clippy::expect_used)]
//! Tests for per-turn routing.
//!
//! Verifies creation and update routing, anchor handling, and that oracle
//! failures never surface as errors.

use serde_json::json;

use super::helpers::*;

// ============================================================================
// Creation
// ============================================================================

/// ## Summary
/// A creation turn resolves contacts and reports what is still missing; a
/// follow-up anchored turn fills the gap and the draft converts to send
/// parameters.
#[test_log::test(tokio::test)]
async fn email_built_over_two_turns() {
    let oracle = ScriptedOracle::new()
        .reply(
            PromptKind::CreationIntent,
            creation_reply("email", &json!({"to_contacts": ["John"], "body": "Let's meet"})),
        )
        .reply(PromptKind::UpdateIntent, update_reply("subject_title", 0.9))
        .reply(PromptKind::FieldUpdate, field_reply(&json!({"subject": "Meeting"})));
    let harness = Harness::new(oracle);

    let created = expect_draft(
        harness
            .router
            .route(&turn("t1", "m1", "email John saying let's meet"))
            .await,
    );
    assert_eq!(created.action, DraftAction::Created);
    assert_eq!(created.draft.thread_id, "t1");
    assert_eq!(created.draft.message_id, "m1");
    assert_eq!(created.draft.status, DraftStatus::Active);
    assert!(!created.completeness.is_complete);
    assert_eq!(created.completeness.missing_fields, vec!["subject"]);
    let email = created.draft.as_email().expect("email payload");
    assert_eq!(email.to_emails, vec![resolved("john@x.com", "John Smith")]);

    let history = vec![
        ConversationTurn::user("email John saying let's meet"),
        ConversationTurn::assistant("What should the subject be?"),
    ];
    let updated = expect_draft(
        harness
            .router
            .route(&anchored_turn(
                "t1",
                "m2",
                "subject: Meeting",
                created.draft.draft_id,
                history,
            ))
            .await,
    );
    assert_eq!(
        updated.action,
        DraftAction::Updated(UpdateCategory::SubjectTitle)
    );
    assert_eq!(updated.draft.draft_id, created.draft.draft_id);
    assert!(updated.completeness.is_complete);

    let params = harness
        .drafts
        .convert_to_delivery_params(created.draft.draft_id)
        .await
        .expect("complete draft converts");
    let DeliveryParams::SendNew(send) = params else {
        panic!("expected a new send, got {params:?}");
    };
    assert_eq!(send.to, vec!["john@x.com"]);
    assert_eq!(send.subject, "Meeting");
    assert_eq!(send.body, "Let's meet");
    assert!(send.cc.is_empty());
}

/// ## Summary
/// A second creation request in the same thread merges into the open draft
/// instead of starting another.
#[test_log::test(tokio::test)]
async fn repeated_creation_merges_into_open_draft() {
    let oracle = ScriptedOracle::new()
        .reply(
            PromptKind::CreationIntent,
            creation_reply("email", &json!({"to_contacts": "Jane"})),
        )
        .reply(
            PromptKind::CreationIntent,
            creation_reply("email", &json!({"subject": "Lunch"})),
        );
    let harness = Harness::new(oracle);

    let first = expect_draft(harness.router.route(&turn("t1", "m1", "email Jane")).await);
    let second = expect_draft(
        harness
            .router
            .route(&turn("t1", "m2", "write an email about lunch"))
            .await,
    );

    assert_eq!(second.action, DraftAction::Merged);
    assert_eq!(second.draft.draft_id, first.draft.draft_id);
    let email = second.draft.as_email().expect("email payload");
    assert_eq!(email.subject.as_deref(), Some("Lunch"));
    assert_eq!(email.to_emails, vec![resolved("jane@x.com", "Jane Doe")]);

    let drafts = harness
        .drafts
        .thread_drafts("t1")
        .await
        .expect("thread drafts");
    assert_eq!(drafts.len(), 1);
}

/// ## Summary
/// Without an explicit clock time, no event time is recorded even when the
/// oracle invents one.
#[test_log::test(tokio::test)]
async fn event_time_requires_explicit_clock_time() {
    let fields = json!({
        "title": "Planning",
        "attendees": ["Jane"],
        "start_time": "2026-10-17T10:00:00",
        "end_time": "2026-10-17T11:00:00"
    });
    let oracle = ScriptedOracle::new().reply(
        PromptKind::CreationIntent,
        creation_reply("calendar_event", &fields),
    );
    let harness = Harness::new(oracle);

    let vague = expect_draft(
        harness
            .router
            .route(&turn("t1", "m1", "schedule planning with Jane on Saturday"))
            .await,
    );
    let event = vague.draft.as_calendar().expect("calendar payload");
    assert_eq!(event.start_time, None);
    assert_eq!(event.end_time, None);
    assert_eq!(
        vague.completeness.missing_fields,
        vec!["start_time", "end_time"]
    );

    let explicit = expect_draft(
        harness
            .router
            .route(&turn("t2", "m1", "schedule planning with Jane on Saturday at 10am"))
            .await,
    );
    assert!(explicit.completeness.is_complete);
    let params = harness
        .drafts
        .convert_to_delivery_params(explicit.draft.draft_id)
        .await
        .expect("complete event converts");
    let DeliveryParams::CreateEvent(event) = params else {
        panic!("expected an event, got {params:?}");
    };
    assert_eq!(event.summary, "Planning");
    assert_eq!(event.attendees, vec!["jane@x.com"]);
    assert_eq!(event.start_time.to_rfc3339(), "2026-10-17T10:00:00+00:00");
}

/// ## Summary
/// Rescheduling an anchored event to a day without a clock time records no
/// time, even when an earlier unrelated turn named one.
#[test_log::test(tokio::test)]
async fn reschedule_without_clock_time_keeps_event_time_unset() {
    let oracle = ScriptedOracle::new()
        .reply(PromptKind::UpdateIntent, update_reply("time_schedule", 0.9))
        .reply(
            PromptKind::FieldUpdate,
            field_reply(&json!({
                "start_time": "2026-10-17T10:00:00",
                "end_time": "2026-10-17T11:00:00"
            })),
        );
    let harness = Harness::new(oracle);
    let draft = harness
        .drafts
        .create_draft(
            DraftType::CalendarEvent,
            "t1",
            "m1",
            &FieldUpdates {
                summary: Some("Planning".to_string()),
                attendees: Some(vec!["Jane".to_string()]),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect("event draft");
    let history = vec![
        ConversationTurn::user("my dentist appointment is at 3pm, ugh"),
        ConversationTurn::assistant("Sorry to hear that."),
    ];

    let outcome = expect_draft(
        harness
            .router
            .route(&anchored_turn("t1", "m2", "move it to Saturday", draft.draft_id, history.clone()))
            .await,
    );
    assert_eq!(
        outcome.action,
        DraftAction::Acknowledged(UpdateCategory::TimeSchedule)
    );
    let event = outcome.draft.as_calendar().expect("calendar payload");
    assert_eq!(event.start_time, None);
    assert_eq!(event.end_time, None);

    let outcome = expect_draft(
        harness
            .router
            .route(&anchored_turn(
                "t1",
                "m3",
                "move it to Saturday at 10am",
                draft.draft_id,
                history,
            ))
            .await,
    );
    assert_eq!(
        outcome.action,
        DraftAction::Updated(UpdateCategory::TimeSchedule)
    );
    let event = outcome.draft.as_calendar().expect("calendar payload");
    assert_eq!(
        event.start_time.map(|t| t.to_rfc3339()),
        Some("2026-10-17T10:00:00+00:00".to_string())
    );
}

/// ## Summary
/// Ordinary chat passes through and creates nothing.
#[test_log::test(tokio::test)]
async fn non_draft_turn_passes_through() {
    let harness =
        Harness::new(ScriptedOracle::new().reply(PromptKind::CreationIntent, no_creation_reply()));

    let outcome = harness
        .router
        .route(&turn("t1", "m1", "what's the weather like?"))
        .await;

    assert_eq!(outcome, RouteOutcome::PassThrough);
    assert!(harness.drafts.thread_drafts("t1").await.expect("drafts").is_empty());
}

// ============================================================================
// Degradation
// ============================================================================

/// ## Summary
/// Prose or a failing oracle degrades to pass-through without writes.
#[test_log::test(tokio::test)]
async fn oracle_failures_pass_through() {
    let prose = Harness::new(
        ScriptedOracle::new().reply(PromptKind::CreationIntent, "Sure! I can help with that."),
    );
    assert_eq!(
        prose.router.route(&turn("t1", "m1", "email John")).await,
        RouteOutcome::PassThrough
    );

    let silent = Harness::new(ScriptedOracle::new());
    assert_eq!(
        silent.router.route(&turn("t1", "m1", "email John")).await,
        RouteOutcome::PassThrough
    );
    assert_eq!(silent.oracle.calls(PromptKind::CreationIntent), 1);
    assert!(silent.drafts.thread_drafts("t1").await.expect("drafts").is_empty());
}

/// ## Summary
/// A failing field extraction acknowledges the intent without writing.
#[test_log::test(tokio::test)]
async fn failed_field_extraction_acknowledges() {
    let harness = Harness::new(
        ScriptedOracle::new().reply(PromptKind::UpdateIntent, update_reply("location", 0.8)),
    );
    let draft = john_email(&harness, "t1").await;

    let outcome = expect_draft(
        harness
            .router
            .route(&anchored_turn("t1", "m2", "somewhere quiet", draft.draft_id, Vec::new()))
            .await,
    );

    assert_eq!(outcome.action, DraftAction::Acknowledged(UpdateCategory::Location));
    assert_eq!(outcome.draft, draft);
    assert_eq!(harness.oracle.calls(PromptKind::FieldUpdate), 1);
}

// ============================================================================
// Updates and anchors
// ============================================================================

/// ## Summary
/// An update with no field changes is acknowledged and leaves the stored
/// draft untouched.
#[test_log::test(tokio::test)]
async fn empty_update_is_acknowledged() {
    let oracle = ScriptedOracle::new()
        .reply(PromptKind::UpdateIntent, update_reply("general_content", 0.9))
        .reply(PromptKind::FieldUpdate, field_reply(&json!({})));
    let harness = Harness::new(oracle);
    let draft = john_email(&harness, "t1").await;

    let outcome = expect_draft(
        harness
            .router
            .route(&anchored_turn("t1", "m2", "looks good", draft.draft_id, Vec::new()))
            .await,
    );

    assert_eq!(
        outcome.action,
        DraftAction::Acknowledged(UpdateCategory::GeneralContent)
    );
    let stored = harness.drafts.get_draft(draft.draft_id).await.expect("draft");
    assert_eq!(stored.updated_at, draft.updated_at);
}

/// ## Summary
/// Low-confidence update intents pass through without extracting fields.
#[test_log::test(tokio::test)]
async fn low_confidence_update_passes_through() {
    let oracle = ScriptedOracle::new()
        .reply(PromptKind::UpdateIntent, update_reply("subject_title", 0.3))
        .reply(PromptKind::FieldUpdate, field_reply(&json!({"subject": "Nope"})));
    let harness = Harness::new(oracle);
    let draft = john_email(&harness, "t1").await;

    let outcome = harness
        .router
        .route(&anchored_turn("t1", "m2", "hmm", draft.draft_id, Vec::new()))
        .await;

    assert_eq!(outcome, RouteOutcome::PassThrough);
    assert_eq!(harness.oracle.calls(PromptKind::FieldUpdate), 0);
}

/// ## Summary
/// "Use that" fills missing fields from the assistant's earlier proposal
/// without asking the oracle for field values.
#[test_log::test(tokio::test)]
async fn content_application_reads_assistant_proposal() {
    let oracle = ScriptedOracle::new().reply(
        PromptKind::UpdateIntent,
        update_reply("content_application", 0.95),
    );
    let harness = Harness::new(oracle);
    let draft = harness
        .drafts
        .create_draft(
            DraftType::Email,
            "t1",
            "m1",
            &FieldUpdates {
                to: Some(vec!["John".to_string()]),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect("draft created");

    let history = vec![
        ConversationTurn::user("help me write to John about the review"),
        ConversationTurn::assistant(
            "Here's a draft:\n\n**Subject:** Quarterly review\n\nBody:\nHi John,\nLet's review the numbers.\n---\nWant changes?",
        ),
    ];
    let outcome = expect_draft(
        harness
            .router
            .route(&anchored_turn("t1", "m2", "use that", draft.draft_id, history))
            .await,
    );

    assert_eq!(
        outcome.action,
        DraftAction::Updated(UpdateCategory::ContentApplication)
    );
    let email = outcome.draft.as_email().expect("email payload");
    assert_eq!(email.subject.as_deref(), Some("Quarterly review"));
    assert_eq!(email.body.as_deref(), Some("Hi John,\nLet's review the numbers."));
    assert!(outcome.completeness.is_complete);
    assert_eq!(harness.oracle.calls(PromptKind::FieldUpdate), 0);
}

/// ## Summary
/// An ambiguous name stays a placeholder until a later turn names the
/// person, which replaces the placeholder in place.
#[test_log::test(tokio::test)]
async fn clarified_recipient_replaces_placeholder() {
    let oracle = ScriptedOracle::new()
        .reply(
            PromptKind::CreationIntent,
            creation_reply(
                "email",
                &json!({"to_contacts": ["Alex"], "subject": "Hi", "body": "Hello"}),
            ),
        )
        .reply(
            PromptKind::UpdateIntent,
            update_reply("recipients_attendees", 0.9),
        )
        .reply(
            PromptKind::FieldUpdate,
            field_reply(&json!({"to_contacts": ["Alex Kim"]})),
        );
    let harness = Harness::new(oracle);

    let created = expect_draft(harness.router.route(&turn("t1", "m1", "email Alex")).await);
    let email = created.draft.as_email().expect("email payload");
    assert_eq!(
        email.to_emails,
        vec![Recipient::needs_clarification(Some("Alex".to_string()))]
    );
    assert_eq!(created.completeness.missing_fields, vec!["to_emails"]);

    let updated = expect_draft(
        harness
            .router
            .route(&anchored_turn("t1", "m2", "Alex Kim", created.draft.draft_id, Vec::new()))
            .await,
    );
    let email = updated.draft.as_email().expect("email payload");
    assert_eq!(email.to_emails, vec![resolved("alex.kim@x.com", "Alex Kim")]);
    assert!(updated.completeness.is_complete);
}

/// ## Summary
/// A draft anchored from another thread is never read or changed.
#[test_log::test(tokio::test)]
async fn anchor_from_other_thread_is_ignored() {
    let oracle = ScriptedOracle::new()
        .reply(PromptKind::UpdateIntent, update_reply("subject_title", 0.9))
        .reply(PromptKind::FieldUpdate, field_reply(&json!({"subject": "Hijacked"})));
    let harness = Harness::new(oracle);
    let draft = john_email(&harness, "t1").await;

    let outcome = harness
        .router
        .route(&anchored_turn("t2", "m1", "call it Hijacked", draft.draft_id, Vec::new()))
        .await;

    assert_eq!(outcome, RouteOutcome::PassThrough);
    assert!(harness.oracle.requests().is_empty());
    let stored = harness.drafts.get_draft(draft.draft_id).await.expect("draft");
    assert_eq!(stored, draft);

    let err = harness
        .drafts
        .get_draft_in_thread(draft.draft_id, "t2")
        .await
        .expect_err("other thread must not see the draft");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

/// ## Summary
/// Anchors to unknown or malformed drafts pass through; a closed draft's
/// anchor falls back to creation handling.
#[test_log::test(tokio::test)]
async fn stale_anchors() {
    let harness =
        Harness::new(ScriptedOracle::new().reply(PromptKind::CreationIntent, no_creation_reply()));

    let unknown = anchored_turn("t1", "m1", "change it", uuid::Uuid::now_v7(), Vec::new());
    assert_eq!(harness.router.route(&unknown).await, RouteOutcome::PassThrough);

    let mut malformed = unknown.clone();
    if let Some(anchor) = malformed.anchor.as_mut() {
        anchor.item_id = "not-a-uuid".to_string();
    }
    assert_eq!(harness.router.route(&malformed).await, RouteOutcome::PassThrough);
    assert!(harness.oracle.requests().is_empty());

    let draft = john_email(&harness, "t1").await;
    harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::Closed)
        .await
        .expect("close");
    let closed = anchored_turn("t1", "m3", "email Jane", draft.draft_id, Vec::new());
    assert_eq!(harness.router.route(&closed).await, RouteOutcome::PassThrough);
    assert_eq!(harness.oracle.calls(PromptKind::CreationIntent), 1);
    assert_eq!(harness.oracle.calls(PromptKind::UpdateIntent), 0);
}
