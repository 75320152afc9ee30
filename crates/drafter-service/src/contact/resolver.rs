//! Free-text recipient resolution.
//!
//! ## Summary
//! Precedence, first match wins:
//! 1. A bare address is used as-is, with a name derived from its local part.
//! 2. An address embedded as `Name <addr>` or `Name (addr)` is used with the
//!    surrounding text as the name. The directory is not consulted.
//! 3. Anything else is looked up in the contact directory. Only a single,
//!    name-consistent hit with an email resolves; everything else becomes a
//!    clarification placeholder.
//!
//! Directory failures degrade to the placeholder. Nothing is dropped: the
//! output always has one record per input token.

use std::sync::Arc;

use drafter_core::util::address::{is_email_address, name_from_email, split_name_and_address};
use drafter_db::model::draft::Recipient;

use super::{ContactDirectory, ContactRecord};

/// Outcome of resolving one recipient reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactResolution {
    Resolved { email: String, name: String },
    NeedsClarification { name: Option<String> },
}

impl From<ContactResolution> for Recipient {
    fn from(resolution: ContactResolution) -> Self {
        match resolution {
            ContactResolution::Resolved { email, name } => {
                Self::resolved(email, (!name.is_empty()).then_some(name))
            }
            ContactResolution::NeedsClarification { name } => Self::needs_clarification(name),
        }
    }
}

pub struct ContactResolver {
    directory: Arc<dyn ContactDirectory>,
    search_limit: usize,
}

fn clean_name(token: &str) -> String {
    token
        .trim()
        .trim_start_matches('@')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == ',' || c == ';')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact (case-insensitive) match, or one name contained in the other.
fn names_agree(query: &str, candidate: &str) -> bool {
    let query = query.to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    !candidate.is_empty() && (candidate == query || candidate.contains(&query) || query.contains(&candidate))
}

impl ContactResolver {
    #[must_use]
    pub fn new(directory: Arc<dyn ContactDirectory>, search_limit: usize) -> Self {
        Self {
            directory,
            search_limit: search_limit.max(2),
        }
    }

    /// ## Summary
    /// Resolves a single recipient reference.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, token: &str) -> ContactResolution {
        let trimmed = token.trim();

        if is_email_address(trimmed) {
            return ContactResolution::Resolved {
                email: trimmed.to_string(),
                name: name_from_email(trimmed),
            };
        }

        if let Some((name, email)) = split_name_and_address(trimmed) {
            let name = name.unwrap_or_else(|| name_from_email(&email));
            return ContactResolution::Resolved { email, name };
        }

        let name = clean_name(trimmed);
        if name.is_empty() {
            tracing::debug!("Empty recipient reference needs clarification");
            return ContactResolution::NeedsClarification { name: None };
        }

        match self.directory.search(&name, self.search_limit).await {
            Ok(candidates) => Self::pick_candidate(&name, &candidates),
            Err(e) => {
                tracing::warn!(error = %e, name = %name, "Contact search failed; asking for clarification");
                ContactResolution::NeedsClarification { name: Some(name) }
            }
        }
    }

    fn pick_candidate(name: &str, candidates: &[ContactRecord]) -> ContactResolution {
        let [candidate] = candidates else {
            tracing::debug!(
                name = %name,
                candidates = candidates.len(),
                "Contact lookup not unique; asking for clarification"
            );
            return ContactResolution::NeedsClarification {
                name: Some(name.to_string()),
            };
        };

        match candidate.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() && names_agree(name, &candidate.name) => {
                tracing::debug!(name = %name, email = %email, "Resolved contact from directory");
                ContactResolution::Resolved {
                    email: email.to_string(),
                    name: candidate.name.clone(),
                }
            }
            _ => ContactResolution::NeedsClarification {
                name: Some(name.to_string()),
            },
        }
    }

    /// ## Summary
    /// Resolves every token, preserving order and length.
    pub async fn resolve_all(&self, tokens: &[String]) -> Vec<Recipient> {
        futures::future::join_all(tokens.iter().map(|token| self.resolve(token)))
            .await
            .into_iter()
            .map(Recipient::from)
            .collect()
    }
}
