#![allow(clippy::unused_async, clippy::expect_used)]
//! Tests for draft lifecycle rules.
//!
//! Verifies closing, status-guarded updates, and thread scoping.

use drafter_core::constants::DRAFT_COLLECTION;

use super::helpers::*;

/// ## Summary
/// Closing is idempotent and one-way.
#[test_log::test(tokio::test)]
async fn close_is_idempotent_and_final() {
    let harness = Harness::new(ScriptedOracle::new());
    let draft = john_email(&harness, "t1").await;

    let closed = harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::Closed)
        .await
        .expect("first close");
    assert_eq!(closed.status, DraftStatus::Closed);

    let again = harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::Closed)
        .await
        .expect("repeat close is a no-op");
    assert_eq!(again, closed);

    let err = harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::ComposioError)
        .await
        .expect_err("closed drafts stay closed");
    assert!(matches!(
        err,
        ServiceError::InvalidState {
            status: DraftStatus::Closed,
            ..
        }
    ));

    let err = harness
        .drafts
        .update_draft(
            draft.draft_id,
            &FieldUpdates {
                subject: Some("Late".to_string()),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect_err("closed drafts reject updates");
    assert!(matches!(err, ServiceError::InvalidState { .. }));

    let err = harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::Active)
        .await
        .expect_err("active is not a terminal status");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

/// ## Summary
/// Active-draft queries are scoped to one thread and exclude closed drafts.
#[test_log::test(tokio::test)]
async fn active_drafts_are_thread_scoped() {
    let harness = Harness::new(ScriptedOracle::new());
    let first = john_email(&harness, "t1").await;
    let second = john_email(&harness, "t1").await;
    let other = john_email(&harness, "t2").await;

    harness
        .drafts
        .close_draft(first.draft_id, DraftStatus::Closed)
        .await
        .expect("close");

    let active = harness
        .drafts
        .active_drafts("t1", Some(DraftType::Email))
        .await
        .expect("active drafts");
    assert_eq!(
        active.iter().map(|d| d.draft_id).collect::<Vec<_>>(),
        vec![second.draft_id]
    );

    let all = harness.drafts.thread_drafts("t1").await.expect("thread drafts");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|d| d.thread_id == "t1"));

    let none = harness
        .drafts
        .active_drafts("t1", Some(DraftType::CalendarEvent))
        .await
        .expect("active drafts");
    assert!(none.is_empty());

    let found = harness
        .drafts
        .get_draft_for_message("t2-m1")
        .await
        .expect("lookup")
        .expect("draft for message");
    assert_eq!(found.draft_id, other.draft_id);
}

/// ## Summary
/// Unknown draft ids and empty thread ids are rejected.
#[test_log::test(tokio::test)]
async fn invalid_identifiers() {
    let harness = Harness::new(ScriptedOracle::new());

    let err = harness
        .drafts
        .update_draft(uuid::Uuid::now_v7(), &FieldUpdates::default())
        .await
        .expect_err("unknown draft");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = harness
        .drafts
        .create_draft(DraftType::Email, "  ", "m1", &FieldUpdates::default())
        .await
        .expect_err("empty thread");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let err = drafter_service::draft::service::parse_draft_type("fax").expect_err("unknown type");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

/// ## Summary
/// A reply needs no subject, and a draft changed behind the service's back
/// is reported rather than overwritten.
#[test_log::test(tokio::test)]
async fn reply_completeness_and_vanished_drafts() {
    let harness = Harness::new(ScriptedOracle::new());
    let reply = harness
        .drafts
        .create_draft(
            DraftType::Email,
            "t1",
            "m1",
            &FieldUpdates {
                to: Some(vec!["jane@x.com".to_string()]),
                body: Some("Sounds good".to_string()),
                gmail_thread_id: Some("gmail-thread-9".to_string()),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect("reply draft");

    let completeness = harness
        .drafts
        .validate_completeness(reply.draft_id)
        .await
        .expect("completeness");
    assert!(completeness.is_complete, "{completeness:?}");

    let plain = john_email(&harness, "t1").await;
    let completeness = harness
        .drafts
        .validate_completeness(plain.draft_id)
        .await
        .expect("completeness");
    assert_eq!(completeness.missing_fields, vec!["subject"]);

    assert!(
        harness
            .store
            .remove(DRAFT_COLLECTION, &plain.draft_id.to_string())
            .await
    );
    let err = harness
        .drafts
        .validate_completeness(plain.draft_id)
        .await
        .expect_err("removed draft");
    assert!(matches!(err, ServiceError::NotFound(_)));
}
