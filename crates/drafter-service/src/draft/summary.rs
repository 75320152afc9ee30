use serde_json::{Value, json};

use drafter_db::model::draft::{Draft, DraftPayload, Recipient};

use super::validate::check_completeness;

fn recipient_labels(recipients: &[Recipient]) -> Vec<Value> {
    recipients
        .iter()
        .map(|r| match (&r.email, &r.name) {
            (Some(email), Some(name)) => json!(format!("{name} <{email}>")),
            (Some(email), None) => json!(email),
            (None, name) => json!({
                "name": name,
                "needs_clarification": true,
            }),
        })
        .collect()
}

/// ## Summary
/// Compact description of a draft given to the oracle as context.
///
/// Carries the type, status, current field values and what is still missing,
/// but no ids or timestamps.
#[must_use]
pub fn summarize(draft: &Draft) -> Value {
    let fields = match &draft.payload {
        DraftPayload::Email(email) => json!({
            "to": recipient_labels(&email.to_emails),
            "cc": recipient_labels(&email.cc_emails),
            "bcc": recipient_labels(&email.bcc_emails),
            "subject": email.subject,
            "body": email.body,
            "attachments": email.attachments.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "is_reply": email.is_reply(),
        }),
        DraftPayload::CalendarEvent(event) => json!({
            "summary": event.summary,
            "start_time": event.start_time.map(|t| t.to_rfc3339()),
            "end_time": event.end_time.map(|t| t.to_rfc3339()),
            "attendees": recipient_labels(&event.attendees),
            "location": event.location,
            "description": event.description,
        }),
    };

    json!({
        "draft_type": draft.draft_type(),
        "status": draft.status,
        "fields": fields,
        "missing_fields": check_completeness(draft).missing_fields,
    })
}
