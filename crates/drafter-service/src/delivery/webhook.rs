use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use drafter_core::constants;

use super::{DeliveryError, DeliveryParams, DeliveryProvider, DeliveryReceipt};

/// Posts delivery parameters as JSON to a fixed URL.
///
/// A 2xx response counts as accepted. The body may carry the provider's id
/// for the created message or event as `provider_message_id`, `message_id`
/// or `id`.
pub struct WebhookDeliveryProvider {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookResponse {
    #[serde(alias = "message_id", alias = "id")]
    provider_message_id: Option<String>,
}

impl WebhookDeliveryProvider {
    /// ## Summary
    /// Builds a provider for `url`.
    ///
    /// ## Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, DeliveryError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DeliveryProvider for WebhookDeliveryProvider {
    #[tracing::instrument(skip_all, fields(url = %self.url))]
    async fn deliver(&self, params: &DeliveryParams) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(params)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(DeliveryError::Rejected(format!("HTTP {status}: {}", text.trim())));
        }

        let parsed = if text.trim().is_empty() {
            WebhookResponse::default()
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Webhook response is not a receipt object");
                WebhookResponse::default()
            })
        };

        Ok(DeliveryReceipt {
            provider_message_id: parsed.provider_message_id,
        })
    }
}
