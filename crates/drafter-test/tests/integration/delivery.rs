#![allow(clippy::unused_async, clippy::expect_used)]
//! Tests for delivering drafts through a provider.
//!
//! Verifies parameter shapes, closing on success, and recovery after a
//! provider rejection.

use super::helpers::*;

/// ## Summary
/// A successful send closes the draft and records the provider's id.
#[test_log::test(tokio::test)]
async fn delivery_closes_draft() {
    let harness = Harness::new(ScriptedOracle::new());
    let provider = RecordingDeliveryProvider::accepting();
    let draft = complete_john_email(&harness, "t1").await;

    let outcome = harness
        .drafts
        .deliver_draft(draft.draft_id, &provider)
        .await
        .expect("delivery");

    let DeliveryOutcome::Delivered { draft: sent, receipt } = outcome else {
        panic!("expected delivery to succeed");
    };
    assert_eq!(sent.status, DraftStatus::Closed);
    assert_eq!(receipt.provider_message_id.as_deref(), Some("provider-1"));
    assert_eq!(
        sent.as_email().and_then(|e| e.sent_message_id.as_deref()),
        Some("provider-1")
    );

    let delivered = provider.delivered();
    assert_eq!(delivered.len(), 1);
    assert!(matches!(&delivered[0], DeliveryParams::SendNew(p) if p.subject == "Meeting"));

    let err = harness
        .drafts
        .deliver_draft(draft.draft_id, &provider)
        .await
        .expect_err("closed drafts are not sent twice");
    assert!(matches!(err, ServiceError::InvalidState { .. }));
    assert_eq!(provider.delivered().len(), 1);
}

/// ## Summary
/// A rejection moves the draft to `composio_error`; the next edit reopens it
/// and a retry succeeds.
#[test_log::test(tokio::test)]
async fn rejected_delivery_recovers_on_update() {
    let harness = Harness::new(ScriptedOracle::new());
    let draft = complete_john_email(&harness, "t1").await;

    let outcome = harness
        .drafts
        .deliver_draft(
            draft.draft_id,
            &RecordingDeliveryProvider::rejecting("quota exceeded"),
        )
        .await
        .expect("a rejection is an outcome, not an error");
    let DeliveryOutcome::Failed { draft: failed, error } = outcome else {
        panic!("expected delivery to fail");
    };
    assert_eq!(failed.status, DraftStatus::ComposioError);
    assert!(error.contains("quota exceeded"), "{error}");
    assert_eq!(failed.error_message.as_deref(), Some(error.as_str()));

    let recovered = harness
        .drafts
        .update_draft(
            draft.draft_id,
            &FieldUpdates {
                body: Some("Let's meet on Friday".to_string()),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect("update reopens the draft");
    assert_eq!(recovered.status, DraftStatus::Active);
    assert_eq!(recovered.error_message, None);

    let provider = RecordingDeliveryProvider::accepting();
    let outcome = harness
        .drafts
        .deliver_draft(draft.draft_id, &provider)
        .await
        .expect("retry");
    assert_eq!(outcome.draft().status, DraftStatus::Closed);
}

/// ## Summary
/// A draft in error can also be abandoned by closing it.
#[test_log::test(tokio::test)]
async fn errored_draft_can_be_closed() {
    let harness = Harness::new(ScriptedOracle::new());
    let draft = complete_john_email(&harness, "t1").await;
    harness
        .drafts
        .deliver_draft(draft.draft_id, &RecordingDeliveryProvider::rejecting("down"))
        .await
        .expect("outcome");

    let closed = harness
        .drafts
        .close_draft(draft.draft_id, DraftStatus::Closed)
        .await
        .expect("close");
    assert_eq!(closed.status, DraftStatus::Closed);
    assert_eq!(closed.error_message, None);
}

/// ## Summary
/// Incomplete drafts never reach the provider.
#[test_log::test(tokio::test)]
async fn incomplete_draft_is_not_sent() {
    let harness = Harness::new(ScriptedOracle::new());
    let provider = RecordingDeliveryProvider::accepting();
    let draft = john_email(&harness, "t1").await;

    let err = harness
        .drafts
        .deliver_draft(draft.draft_id, &provider)
        .await
        .expect_err("missing subject");
    let ServiceError::Incomplete { missing_fields } = err else {
        panic!("expected Incomplete, got {err:?}");
    };
    assert_eq!(missing_fields, vec!["subject"]);
    assert!(provider.delivered().is_empty());

    let stored = harness.drafts.get_draft(draft.draft_id).await.expect("draft");
    assert_eq!(stored.status, DraftStatus::Active);
}

/// ## Summary
/// Replies carry the provider thread and move extra recipients to cc.
#[test_log::test(tokio::test)]
async fn reply_parameters() {
    let harness = Harness::new(ScriptedOracle::new());
    let draft = harness
        .drafts
        .create_draft(
            DraftType::Email,
            "t1",
            "m1",
            &FieldUpdates {
                to: Some(vec!["jane@x.com".to_string(), "John".to_string()]),
                cc: Some(vec!["Alex Park".to_string()]),
                body: Some("Thanks both".to_string()),
                gmail_thread_id: Some("gmail-thread-9".to_string()),
                reply_to_email_id: Some("gmail-msg-3".to_string()),
                ..FieldUpdates::default()
            },
        )
        .await
        .expect("reply draft");

    let params = harness
        .drafts
        .convert_to_delivery_params(draft.draft_id)
        .await
        .expect("params");
    let DeliveryParams::Reply(reply) = params else {
        panic!("expected a reply, got {params:?}");
    };
    assert_eq!(reply.thread_ref, "gmail-thread-9");
    assert_eq!(reply.recipient_email, "jane@x.com");
    assert_eq!(reply.cc, vec!["john@x.com", "alex.park@x.com"]);
    assert_eq!(reply.reply_to_message_id.as_deref(), Some("gmail-msg-3"));
}
