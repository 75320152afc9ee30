use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use drafter_db::model::draft::{Attachment, CalendarDraft, Draft, DraftPayload, EmailDraft, Recipient};

use crate::draft::validate::check_completeness;
use crate::error::{ServiceError, ServiceResult};

/// Parameters for the external API, one shape per kind of action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryParams {
    SendNew(SendNewParams),
    Reply(ReplyParams),
    CreateEvent(CreateEventParams),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendNewParams {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParams {
    /// Provider thread being replied to.
    pub thread_ref: String,
    pub recipient_email: String,
    pub body: String,
    /// Carries any `to` recipients beyond the first, followed by the draft's cc.
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventParams {
    pub summary: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl DeliveryParams {
    /// ## Summary
    /// Converts a complete draft into the parameters its provider call needs.
    ///
    /// Emails with a provider thread become replies, other emails become new
    /// sends, and calendar drafts become event creations.
    ///
    /// ## Errors
    /// Returns `Incomplete` with the missing fields when the draft is not
    /// complete.
    pub fn from_draft(draft: &Draft) -> ServiceResult<Self> {
        let completeness = check_completeness(draft);
        if !completeness.is_complete {
            return Err(ServiceError::Incomplete {
                missing_fields: completeness.missing_fields,
            });
        }

        match &draft.payload {
            DraftPayload::Email(email) => match email.gmail_thread_id.as_deref() {
                Some(thread_ref) => reply_params(email, thread_ref),
                None => send_new_params(email),
            },
            DraftPayload::CalendarEvent(event) => create_event_params(event),
        }
    }
}

/// Resolved addresses of `recipients`; placeholders are left out.
fn addresses(field: &'static str, recipients: &[Recipient]) -> Vec<String> {
    recipients
        .iter()
        .filter_map(|r| {
            let address = r.is_resolved().then(|| r.email.clone()).flatten();
            if address.is_none() {
                tracing::warn!(field, name = ?r.name, "Leaving unresolved recipient out of delivery");
            }
            address
        })
        .collect()
}

fn incomplete(field: &'static str) -> ServiceError {
    ServiceError::Incomplete {
        missing_fields: vec![field],
    }
}

fn send_new_params(email: &EmailDraft) -> ServiceResult<DeliveryParams> {
    Ok(DeliveryParams::SendNew(SendNewParams {
        to: addresses("to_emails", &email.to_emails),
        cc: addresses("cc_emails", &email.cc_emails),
        bcc: addresses("bcc_emails", &email.bcc_emails),
        subject: email.subject.clone().ok_or_else(|| incomplete("subject"))?,
        body: email.body.clone().ok_or_else(|| incomplete("body"))?,
        attachments: email.attachments.clone(),
    }))
}

fn reply_params(email: &EmailDraft, thread_ref: &str) -> ServiceResult<DeliveryParams> {
    let mut to = addresses("to_emails", &email.to_emails).into_iter();
    let recipient_email = to.next().ok_or_else(|| incomplete("to_emails"))?;
    let cc = to.chain(addresses("cc_emails", &email.cc_emails)).collect();

    Ok(DeliveryParams::Reply(ReplyParams {
        thread_ref: thread_ref.to_string(),
        recipient_email,
        body: email.body.clone().ok_or_else(|| incomplete("body"))?,
        cc,
        bcc: addresses("bcc_emails", &email.bcc_emails),
        reply_to_message_id: email.reply_to_email_id.clone(),
    }))
}

fn create_event_params(event: &CalendarDraft) -> ServiceResult<DeliveryParams> {
    Ok(DeliveryParams::CreateEvent(CreateEventParams {
        summary: event.summary.clone().ok_or_else(|| incomplete("summary"))?,
        start_time: event.start_time.ok_or_else(|| incomplete("start_time"))?,
        end_time: event.end_time.ok_or_else(|| incomplete("end_time"))?,
        attendees: addresses("attendees", &event.attendees),
        location: event.location.clone(),
        description: event.description.clone(),
    }))
}
