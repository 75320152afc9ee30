use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use drafter_core::config::OracleConfig;
use drafter_core::constants;

use super::prompt::{system_prompt, user_prompt};
use super::{Oracle, OracleError, OracleRequest};

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsOracle {
    /// ## Summary
    /// Builds a client from the `[oracle]` settings.
    ///
    /// ## Errors
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| OracleError::Transport(format!("invalid api key header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: config.completions_url(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Oracle for ChatCompletionsOracle {
    #[tracing::instrument(skip_all, fields(kind = request.prompt_kind.as_str(), model = %self.model))]
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let system = system_prompt(request.prompt_kind);
        let user = user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OracleError::Response(format!("HTTP {status}: {text}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Response(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Response("missing choices".to_string()))?;

        tracing::trace!(len = content.len(), "Oracle completion received");
        Ok(content)
    }
}
