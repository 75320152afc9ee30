//! Per-type completeness rules.
//!
//! ## Summary
//! Each payload variant has a static rule table. A draft is complete when
//! every applicable rule is satisfied; `missing_fields` lists the failing
//! rules in table order.

use serde::Serialize;

use drafter_db::model::draft::{CalendarDraft, Draft, DraftPayload, EmailDraft, Recipient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    pub is_complete: bool,
    pub missing_fields: Vec<&'static str>,
}

struct FieldRule<T> {
    field: &'static str,
    /// Rules that do not apply to a given draft count as satisfied.
    applies: fn(&T) -> bool,
    satisfied: fn(&T) -> bool,
}

const fn always<T>(_: &T) -> bool {
    true
}

fn has_text(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn all_resolved(recipients: &[Recipient]) -> bool {
    recipients.iter().all(Recipient::is_resolved)
}

const EMAIL_RULES: &[FieldRule<EmailDraft>] = &[
    FieldRule {
        field: "to_emails",
        applies: always,
        satisfied: |e| !e.to_emails.is_empty() && all_resolved(&e.to_emails),
    },
    FieldRule {
        field: "subject",
        applies: |e| !e.is_reply(),
        satisfied: |e| has_text(e.subject.as_ref()),
    },
    FieldRule {
        field: "body",
        applies: always,
        satisfied: |e| has_text(e.body.as_ref()),
    },
];

const CALENDAR_RULES: &[FieldRule<CalendarDraft>] = &[
    FieldRule {
        field: "summary",
        applies: always,
        satisfied: |c| has_text(c.summary.as_ref()),
    },
    FieldRule {
        field: "start_time",
        applies: always,
        satisfied: |c| c.start_time.is_some(),
    },
    FieldRule {
        field: "end_time",
        applies: always,
        satisfied: |c| c.end_time.is_some(),
    },
    // Attendees are optional, but one awaiting clarification blocks creation.
    FieldRule {
        field: "attendees",
        applies: always,
        satisfied: |c| all_resolved(&c.attendees),
    },
];

fn missing<T>(rules: &[FieldRule<T>], payload: &T) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(payload) && !(rule.satisfied)(payload))
        .map(|rule| rule.field)
        .collect()
}

/// ## Summary
/// Evaluates the completeness rules for a draft's type.
#[must_use]
pub fn check_completeness(draft: &Draft) -> Completeness {
    let missing_fields = match &draft.payload {
        DraftPayload::Email(email) => missing(EMAIL_RULES, email),
        DraftPayload::CalendarEvent(event) => missing(CALENDAR_RULES, event),
    };
    Completeness {
        is_complete: missing_fields.is_empty(),
        missing_fields,
    }
}
