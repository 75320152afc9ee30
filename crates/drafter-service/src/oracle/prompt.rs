use std::fmt::Write;

use drafter_core::types::UpdateCategory;

use super::{OracleRequest, PromptKind};

const SHARED_RULES: &str = "\
Rules:
1) Return ONLY one JSON object. No prose, no markdown.
2) Leave out any field the user did not state. Never invent values.
3) Only output start_time or end_time when the user gave an explicit clock \
time (for example \"3pm\", \"15:00\", \"noon\"). A date, weekday name or \
relative word such as \"Saturday\" or \"tomorrow\" alone is NOT a time: omit \
the field.
4) Times are ISO 8601 (\"2026-10-17T15:00:00\" or with an offset).
5) Recipients and attendees are lists of names or email addresses exactly as \
the user wrote them.";

const CREATION_INTENT: &str = "\
You decide whether the user's latest message asks to compose an email or to \
schedule a calendar event.
Respond with:
{\"is_draft_intent\": bool, \"draft_type\": \"email\" | \"calendar_event\" | null, \
\"extracted_fields\": {...}}
Email fields: to_contacts, cc_contacts, bcc_contacts, subject, body.
Calendar fields: summary, start_time, end_time, attendees, location, description.
Questions, small talk and requests about existing items are NOT draft intents.";

const UPDATE_INTENT: &str = "\
The user is looking at the draft described in the context. Decide whether \
their latest message modifies or finalizes that draft.
Respond with:
{\"is_update_intent\": bool, \"update_category\": string | null, \"confidence\": number}
confidence is between 0 and 1.";

const FIELD_UPDATE: &str = "\
The user is modifying the draft described in the context. Extract only the \
fields their latest message changes.
Respond with:
{\"field_updates\": {...}}
Email fields: to_contacts, cc_contacts, bcc_contacts, subject, body.
Calendar fields: summary, start_time, end_time, attendees, location, description.
Set \"replace_recipients\": true only when the user replaces recipients rather \
than adding to them.
For completion_finalization and content_application an empty object is a \
valid answer.";

/// ## Summary
/// Returns the system prompt for a contract.
#[must_use]
pub fn system_prompt(kind: PromptKind) -> String {
    let mut prompt = String::new();
    match kind {
        PromptKind::CreationIntent => prompt.push_str(CREATION_INTENT),
        PromptKind::UpdateIntent => {
            prompt.push_str(UPDATE_INTENT);
            prompt.push_str("\nupdate_category is one of:\n");
            for category in UpdateCategory::ALL {
                let _ = writeln!(prompt, "- {category}");
            }
        }
        PromptKind::FieldUpdate => prompt.push_str(FIELD_UPDATE),
    }
    prompt.push_str("\n\n");
    prompt.push_str(SHARED_RULES);
    prompt
}

/// ## Summary
/// Renders the user-side message: context, recent history and the latest turn.
#[must_use]
pub fn user_prompt(request: &OracleRequest) -> String {
    let mut user = String::new();
    if let Some(context) = &request.context {
        let _ = writeln!(user, "Context:\n{context}\n");
    }
    if !request.history.is_empty() {
        user.push_str("History:\n");
        for turn in &request.history {
            let _ = writeln!(user, "- {}: {}", turn.role.as_str(), turn.content);
        }
        user.push('\n');
    }
    let _ = writeln!(user, "Latest user message:\n{}", request.user_message);
    user.push_str("\nReturn JSON only.\n");
    user
}
