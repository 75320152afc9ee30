use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use drafter_core::types::DraftType;
use drafter_db::model::draft::Attachment;

/// How list-valued updates combine with what the draft already holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Add new entries, skipping ones already present.
    #[default]
    Append,
    /// Discard the current entries of every list that the update sets.
    Replace,
}

/// A typed partial update to a draft.
///
/// Recipient lists hold free-text references (`"Jane"`,
/// `"Jane <jane@x.com>"`, `"jane@x.com"`) that are resolved against the
/// contact directory when the update is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldUpdates {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub to: Option<Vec<String>>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub attachments: Option<Vec<Attachment>>,
    pub gmail_thread_id: Option<String>,
    pub reply_to_email_id: Option<String>,

    pub summary: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub attendees: Option<Vec<String>>,
    pub location: Option<String>,
    pub description: Option<String>,

    pub list_mode: ListMode,
}

impl FieldUpdates {
    /// Names of the fields this update sets, in declaration order.
    #[must_use]
    pub fn set_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("subject", self.subject.is_some()),
            ("body", self.body.is_some()),
            ("to_emails", self.to.is_some()),
            ("cc_emails", self.cc.is_some()),
            ("bcc_emails", self.bcc.is_some()),
            ("attachments", self.attachments.is_some()),
            ("gmail_thread_id", self.gmail_thread_id.is_some()),
            ("reply_to_email_id", self.reply_to_email_id.is_some()),
            ("summary", self.summary.is_some()),
            ("start_time", self.start_time.is_some()),
            ("end_time", self.end_time.is_some()),
            ("attendees", self.attendees.is_some()),
            ("location", self.location.is_some()),
            ("description", self.description.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// True when applying the update would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_fields().is_empty()
    }

    /// Set fields that have no meaning for `draft_type`.
    #[must_use]
    pub fn foreign_fields(&self, draft_type: DraftType) -> Vec<&'static str> {
        self.set_fields()
            .into_iter()
            .filter(|field| !field_applies(field, draft_type))
            .collect()
    }
}

fn field_applies(field: &str, draft_type: DraftType) -> bool {
    const EMAIL: &[&str] = &[
        "subject",
        "body",
        "to_emails",
        "cc_emails",
        "bcc_emails",
        "attachments",
        "gmail_thread_id",
        "reply_to_email_id",
    ];
    match draft_type {
        DraftType::Email => EMAIL.contains(&field),
        DraftType::CalendarEvent => !EMAIL.contains(&field),
    }
}
