use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use drafter_core::types::{DraftStatus, DraftType};

/// A persisted, incrementally built email or calendar event.
///
/// The envelope (identity, ownership, status) is shared; the type-specific
/// fields live in [`DraftPayload`], whose tag is serialized as `draft_type`
/// alongside the envelope fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub draft_id: uuid::Uuid,
    /// Owning conversation. Never changes after creation.
    pub thread_id: String,
    /// Turn that created the draft.
    pub message_id: String,
    pub status: DraftStatus,
    /// Last delivery rejection; only set while `status` is `composio_error`.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub payload: DraftPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "draft_type", rename_all = "snake_case")]
pub enum DraftPayload {
    Email(EmailDraft),
    CalendarEvent(CalendarDraft),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailDraft {
    pub to_emails: Vec<Recipient>,
    pub cc_emails: Vec<Recipient>,
    pub bcc_emails: Vec<Recipient>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Provider thread being replied to; its presence makes the draft a reply.
    pub gmail_thread_id: Option<String>,
    pub reply_to_email_id: Option<String>,
    pub sent_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarDraft {
    pub summary: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub attendees: Vec<Recipient>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Email recipient or event attendee.
///
/// Either resolved (`email` set) or a placeholder that still needs the user
/// to clarify who was meant (`email` unset, `needs_clarification` true).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_clarification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl Draft {
    /// ## Summary
    /// Builds a new `active` draft with an empty payload of the given type.
    #[must_use]
    pub fn new(draft_type: DraftType, thread_id: &str, message_id: &str) -> Self {
        let now = Utc::now();
        Self {
            draft_id: uuid::Uuid::now_v7(),
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
            status: DraftStatus::Active,
            error_message: None,
            payload: DraftPayload::empty(draft_type),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn draft_type(&self) -> DraftType {
        self.payload.draft_type()
    }

    /// True for email drafts replying to an existing provider thread.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(&self.payload, DraftPayload::Email(email) if email.is_reply())
    }

    #[must_use]
    pub const fn as_email(&self) -> Option<&EmailDraft> {
        match &self.payload {
            DraftPayload::Email(email) => Some(email),
            DraftPayload::CalendarEvent(_) => None,
        }
    }

    #[must_use]
    pub const fn as_calendar(&self) -> Option<&CalendarDraft> {
        match &self.payload {
            DraftPayload::CalendarEvent(event) => Some(event),
            DraftPayload::Email(_) => None,
        }
    }

    /// Returns true when this draft is owned by `thread_id`.
    #[must_use]
    pub fn belongs_to(&self, thread_id: &str) -> bool {
        self.thread_id == thread_id
    }
}

impl DraftPayload {
    #[must_use]
    pub fn empty(draft_type: DraftType) -> Self {
        match draft_type {
            DraftType::Email => Self::Email(EmailDraft::default()),
            DraftType::CalendarEvent => Self::CalendarEvent(CalendarDraft::default()),
        }
    }

    #[must_use]
    pub const fn draft_type(&self) -> DraftType {
        match self {
            Self::Email(_) => DraftType::Email,
            Self::CalendarEvent(_) => DraftType::CalendarEvent,
        }
    }
}

impl EmailDraft {
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.gmail_thread_id.is_some()
    }
}

impl Recipient {
    #[must_use]
    pub fn resolved(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: Some(email.into()),
            name,
            needs_clarification: false,
        }
    }

    #[must_use]
    pub const fn needs_clarification(name: Option<String>) -> Self {
        Self {
            email: None,
            name,
            needs_clarification: true,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.needs_clarification && self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// Key used to detect duplicates when appending to a recipient list.
    #[must_use]
    pub fn identity_key(&self) -> String {
        match (&self.email, &self.name) {
            (Some(email), _) => drafter_core::util::address::normalize_address(email),
            (None, Some(name)) => format!("name:{}", name.trim().to_lowercase()),
            (None, None) => String::new(),
        }
    }
}
