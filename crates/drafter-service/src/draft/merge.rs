//! Applying a [`FieldUpdates`] to a draft payload.
//!
//! Scalars overwrite. Lists append without duplicates unless the update
//! asks for replacement. A resolved recipient whose name matches a pending
//! placeholder takes that placeholder's slot instead of being appended.

use drafter_db::model::draft::{Attachment, CalendarDraft, DraftPayload, EmailDraft, Recipient};

use super::fields::{FieldUpdates, ListMode};

/// Recipient lists of an update after contact resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRecipients {
    pub to: Option<Vec<Recipient>>,
    pub cc: Option<Vec<Recipient>>,
    pub bcc: Option<Vec<Recipient>>,
    pub attendees: Option<Vec<Recipient>>,
}

fn set_text(target: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

fn same_person(placeholder: &Recipient, incoming: &Recipient) -> bool {
    let (Some(pending), Some(name)) = (placeholder.name.as_deref(), incoming.name.as_deref()) else {
        return false;
    };
    let pending = pending.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    !pending.is_empty() && (pending == name || name.contains(&pending))
}

fn append_recipient(list: &mut Vec<Recipient>, incoming: Recipient) {
    if incoming.is_resolved()
        && let Some(slot) = list
            .iter_mut()
            .find(|r| r.needs_clarification && same_person(r, &incoming))
    {
        *slot = incoming;
        return;
    }

    let key = incoming.identity_key();
    if !key.is_empty() && list.iter().any(|r| r.identity_key() == key) {
        tracing::trace!(key = %key, "Skipping duplicate recipient");
        return;
    }
    list.push(incoming);
}

fn merge_recipients(list: &mut Vec<Recipient>, incoming: Option<Vec<Recipient>>, mode: ListMode) {
    let Some(incoming) = incoming else {
        return;
    };
    if mode == ListMode::Replace {
        list.clear();
    }
    for recipient in incoming {
        append_recipient(list, recipient);
    }
}

fn merge_attachments(list: &mut Vec<Attachment>, incoming: Option<&Vec<Attachment>>, mode: ListMode) {
    let Some(incoming) = incoming else {
        return;
    };
    if mode == ListMode::Replace {
        list.clear();
    }
    for attachment in incoming {
        if !list.iter().any(|a| a.uri == attachment.uri) {
            list.push(attachment.clone());
        }
    }
}

fn apply_email(email: &mut EmailDraft, updates: &FieldUpdates, recipients: ResolvedRecipients) {
    let mode = updates.list_mode;
    merge_recipients(&mut email.to_emails, recipients.to, mode);
    merge_recipients(&mut email.cc_emails, recipients.cc, mode);
    merge_recipients(&mut email.bcc_emails, recipients.bcc, mode);
    set_text(&mut email.subject, updates.subject.as_ref());
    set_text(&mut email.body, updates.body.as_ref());
    merge_attachments(&mut email.attachments, updates.attachments.as_ref(), mode);
    set_text(&mut email.gmail_thread_id, updates.gmail_thread_id.as_ref());
    set_text(&mut email.reply_to_email_id, updates.reply_to_email_id.as_ref());
}

fn apply_calendar(event: &mut CalendarDraft, updates: &FieldUpdates, recipients: ResolvedRecipients) {
    set_text(&mut event.summary, updates.summary.as_ref());
    if let Some(start) = updates.start_time {
        event.start_time = Some(start);
    }
    if let Some(end) = updates.end_time {
        event.end_time = Some(end);
    }
    merge_recipients(&mut event.attendees, recipients.attendees, updates.list_mode);
    set_text(&mut event.location, updates.location.as_ref());
    set_text(&mut event.description, updates.description.as_ref());
}

/// ## Summary
/// Applies `updates` to `payload`.
///
/// Only the fields belonging to the payload's type are read; callers log the
/// rest.
pub fn apply_updates(payload: &mut DraftPayload, updates: &FieldUpdates, recipients: ResolvedRecipients) {
    match payload {
        DraftPayload::Email(email) => apply_email(email, updates, recipients),
        DraftPayload::CalendarEvent(event) => apply_calendar(event, updates, recipients),
    }
}
