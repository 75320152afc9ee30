//! Enumerations shared by the store, service, and router layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kind of object a draft builds up. Immutable once a draft exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftType {
    Email,
    CalendarEvent,
}

impl DraftType {
    pub const ALL: [Self; 2] = [Self::Email, Self::CalendarEvent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::CalendarEvent => "calendar_event",
        }
    }
}

impl fmt::Display for DraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "calendar_event" | "calendar" | "event" => Ok(Self::CalendarEvent),
            other => Err(CoreError::InvalidInput(format!(
                "unknown draft type '{other}'"
            ))),
        }
    }
}

/// Lifecycle status of a draft.
///
/// `Active` is the only status that accepts ordinary updates. `ComposioError`
/// marks a rejected delivery; the next accepted update resets it to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Active,
    Closed,
    ComposioError,
}

impl DraftStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::ComposioError => "composio_error",
        }
    }

    /// Statuses a draft may be closed into.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::ComposioError)
    }

    /// Whether `update` is accepted in this status.
    #[must_use]
    pub const fn accepts_updates(self) -> bool {
        matches!(self, Self::Active | Self::ComposioError)
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "composio_error" => Ok(Self::ComposioError),
            other => Err(CoreError::InvalidInput(format!(
                "unknown draft status '{other}'"
            ))),
        }
    }
}

/// What part of an anchored draft a follow-up message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCategory {
    SubjectTitle,
    BodyDescription,
    RecipientsAttendees,
    TimeSchedule,
    Location,
    CompletionFinalization,
    ContentApplication,
    GeneralContent,
}

impl UpdateCategory {
    pub const ALL: [Self; 8] = [
        Self::SubjectTitle,
        Self::BodyDescription,
        Self::RecipientsAttendees,
        Self::TimeSchedule,
        Self::Location,
        Self::CompletionFinalization,
        Self::ContentApplication,
        Self::GeneralContent,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubjectTitle => "subject_title",
            Self::BodyDescription => "body_description",
            Self::RecipientsAttendees => "recipients_attendees",
            Self::TimeSchedule => "time_schedule",
            Self::Location => "location",
            Self::CompletionFinalization => "completion_finalization",
            Self::ContentApplication => "content_application",
            Self::GeneralContent => "general_content",
        }
    }

    /// Categories whose content comes from earlier assistant turns rather
    /// than from the user message itself. Empty field updates are expected.
    #[must_use]
    pub const fn uses_conversation_content(self) -> bool {
        matches!(self, Self::CompletionFinalization | Self::ContentApplication)
    }
}

impl fmt::Display for UpdateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown update category '{s}'")))
    }
}
