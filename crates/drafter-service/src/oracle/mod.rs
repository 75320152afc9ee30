//! Oracle seam and the three structured-inference contracts built on it.
//!
//! ## Module Organization
//!
//! - `adapter`: Turns oracle text into typed intents and field updates
//! - `http`: OpenAI-compatible chat-completions client
//! - `json`: Locates a JSON object inside free-form model output
//! - `prompt`: System prompts for each contract
//! - `time`: Clock-time detection and timestamp normalization

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::ConversationTurn;

pub mod adapter;
pub mod http;
pub mod json;
pub mod prompt;
pub mod time;

pub use adapter::{CreationIntent, OracleAdapter, UpdateIntent};
pub use http::ChatCompletionsOracle;

/// Which contract a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    CreationIntent,
    UpdateIntent,
    FieldUpdate,
}

impl PromptKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreationIntent => "creation_intent",
            Self::UpdateIntent => "update_intent",
            Self::FieldUpdate => "field_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRequest {
    pub prompt_kind: PromptKind,
    pub user_message: String,
    pub history: Vec<ConversationTurn>,
    /// Draft summary and contract-specific inputs such as the update category.
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle response error: {0}")]
    Response(String),
}

/// Text-completion collaborator. Implementations must not retry.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError>;
}
