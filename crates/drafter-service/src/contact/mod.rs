//! Contact directory seam and recipient resolution.
//!
//! ## Module Organization
//!
//! - `resolver`: Turns free-text recipient references into resolved records
//!   or clarification placeholders

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod resolver;

pub use resolver::{ContactResolution, ContactResolver};

/// A directory entry returned by a contact search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Contact directory unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read contacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse contacts: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Contact lookup collaborator.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Search contacts by name or address fragment, returning at most `limit` entries.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContactRecord>, DirectoryError>;
}

/// Directory backed by a fixed list of contacts.
///
/// Matches case-insensitively on any substring of the name or email.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactDirectory {
    contacts: Vec<ContactRecord>,
}

impl InMemoryContactDirectory {
    #[must_use]
    pub const fn new(contacts: Vec<ContactRecord>) -> Self {
        Self { contacts }
    }

    /// ## Summary
    /// Loads contacts from a JSON array of `{name, email?, phone?}` objects.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let contacts: Vec<ContactRecord> = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            count = contacts.len(),
            "Loaded contact directory"
        );
        Ok(Self { contacts })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContactRecord>, DirectoryError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .contacts
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c
                        .email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
