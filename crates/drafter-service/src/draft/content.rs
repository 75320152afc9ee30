//! Recovering draft content the assistant already proposed.
//!
//! When a user says "use that" or "send it", the subject or body they mean
//! usually sits in an earlier assistant turn rather than in their message.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use drafter_db::model::draft::{Draft, DraftPayload};

use super::fields::FieldUpdates;
use crate::conversation::{ConversationTurn, Role};

/// Extracts field values for a draft from the conversation.
///
/// Implementations fill only fields the draft is still missing.
pub trait ContentResolver: Send + Sync {
    fn resolve(&self, history: &[ConversationTurn], draft: &Draft) -> FieldUpdates;
}

/// Reads labelled lines (`Subject: ...`, `**Title:** ...`, `## Location: ...`)
/// and labelled blocks (`Body:` up to the next label) from recent assistant
/// turns. Newer turns win.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicContentResolver {
    scan_turns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Label {
    Subject,
    Title,
    Summary,
    Event,
    Location,
    Description,
    Body,
    Message,
    /// Any other header-like label; ends a block.
    Other,
}

impl Label {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "subject" => Self::Subject,
            "title" => Self::Title,
            "summary" => Self::Summary,
            "event" => Self::Event,
            "location" => Self::Location,
            "description" => Self::Description,
            "body" => Self::Body,
            "message" => Self::Message,
            _ => Self::Other,
        }
    }

    const fn is_block(self) -> bool {
        matches!(self, Self::Body | Self::Message | Self::Description)
    }
}

fn re_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^\s*
            (?:\#{1,6}\s*)?
            (?:[-*>]\s+)?
            (?:\*\*|__)?\s*
            (subject|title|summary|event|location|description|body|message
             |to|cc|bcc|from|date|time|when|where|attendees|recipients|start|end)
            \s*(?:\*\*|__)?\s*:\s*(?:\*\*|__)?
            \s*(.*?)\s*$",
        )
        .unwrap_or_else(|e| unreachable!("label pattern is valid: {e}"))
    })
}

fn strip_emphasis(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '*' || c == '_' || c == '"')
        .trim()
        .to_string()
}

fn is_block_end(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("```") || trimmed == "---"
}

/// Collects the labelled values of one message; the first occurrence of a
/// label wins.
fn labelled_values(text: &str) -> HashMap<Label, String> {
    let mut values = HashMap::new();
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = re_label().captures(lines[i]) else {
            i += 1;
            continue;
        };
        let label = Label::parse(caps.get(1).map_or("", |m| m.as_str()));
        let inline = caps.get(2).map_or("", |m| m.as_str());
        i += 1;

        if label.is_block() {
            let mut block = vec![inline.to_string()];
            while i < lines.len() && !re_label().is_match(lines[i]) && !is_block_end(lines[i]) {
                block.push(lines[i].to_string());
                i += 1;
            }
            let body = block.join("\n").trim().to_string();
            if !body.is_empty() {
                values.entry(label).or_insert(body);
            }
        } else if label != Label::Other {
            let value = strip_emphasis(inline);
            if !value.is_empty() {
                values.entry(label).or_insert(value);
            }
        }
    }
    values
}

fn pick(values: &HashMap<Label, String>, labels: &[Label]) -> Option<String> {
    labels.iter().find_map(|label| values.get(label).cloned())
}

fn missing(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl HeuristicContentResolver {
    #[must_use]
    pub const fn new(scan_turns: usize) -> Self {
        Self { scan_turns }
    }

    /// Labelled values from the most recent assistant turns, newest first.
    fn scan(&self, history: &[ConversationTurn]) -> HashMap<Label, String> {
        let mut merged = HashMap::new();
        for turn in history
            .iter()
            .rev()
            .filter(|turn| turn.role == Role::Assistant)
            .take(self.scan_turns)
        {
            for (label, value) in labelled_values(&turn.content) {
                merged.entry(label).or_insert(value);
            }
        }
        merged
    }
}

impl ContentResolver for HeuristicContentResolver {
    #[tracing::instrument(skip_all, fields(draft_id = %draft.draft_id))]
    fn resolve(&self, history: &[ConversationTurn], draft: &Draft) -> FieldUpdates {
        let values = self.scan(history);
        let mut updates = FieldUpdates::default();

        match &draft.payload {
            DraftPayload::Email(email) => {
                if missing(email.subject.as_ref()) {
                    updates.subject = pick(&values, &[Label::Subject, Label::Title]);
                }
                if missing(email.body.as_ref()) {
                    updates.body = pick(&values, &[Label::Body, Label::Message]);
                }
            }
            DraftPayload::CalendarEvent(event) => {
                if missing(event.summary.as_ref()) {
                    updates.summary = pick(&values, &[Label::Title, Label::Summary, Label::Event]);
                }
                if missing(event.location.as_ref()) {
                    updates.location = pick(&values, &[Label::Location]);
                }
                if missing(event.description.as_ref()) {
                    updates.description = pick(&values, &[Label::Description]);
                }
            }
        }

        tracing::debug!(fields = ?updates.set_fields(), "Resolved content from conversation");
        updates
    }
}
