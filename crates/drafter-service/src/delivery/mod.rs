//! Delivery provider seam.
//!
//! ## Module Organization
//!
//! - `params`: Provider-agnostic send/reply/create-event parameters built
//!   from complete drafts
//! - `webhook`: Provider that posts parameters to an HTTP endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use drafter_db::model::draft::Draft;

pub mod params;
pub mod webhook;

pub use params::{CreateEventParams, DeliveryParams, ReplyParams, SendNewParams};
pub use webhook::WebhookDeliveryProvider;

/// What a provider reports back after accepting a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub provider_message_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider refused the request.
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Delivery transport error: {0}")]
    Transport(String),
}

/// Result of handing a draft to a provider.
///
/// A provider failure is an outcome, not an error: the draft is kept in
/// `composio_error` with the rejection text so it can be corrected and
/// retried.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered { draft: Draft, receipt: DeliveryReceipt },
    Failed { draft: Draft, error: String },
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn draft(&self) -> &Draft {
        match self {
            Self::Delivered { draft, .. } | Self::Failed { draft, .. } => draft,
        }
    }
}

/// External send/create API.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    async fn deliver(&self, params: &DeliveryParams) -> Result<DeliveryReceipt, DeliveryError>;
}
