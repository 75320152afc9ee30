//! Drafter integration test support.
//!
//! Provides scripted collaborators and a fully wired in-memory harness so
//! integration tests can drive the router and draft service end to end.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use drafter_db::db::store::InMemoryStore;
use drafter_service::contact::{ContactRecord, ContactResolver, InMemoryContactDirectory};
use drafter_service::conversation::ConversationTurn;
use drafter_service::delivery::{DeliveryError, DeliveryParams, DeliveryProvider, DeliveryReceipt};
use drafter_service::draft::{DraftService, HeuristicContentResolver};
use drafter_service::oracle::{Oracle, OracleAdapter, OracleError, OracleRequest, PromptKind};
use drafter_service::router::{AnchoredItem, ConversationRouter, Turn};

pub use drafter_core as core;
pub use drafter_db as db;
pub use drafter_service as service;

/// Locks a mutex and recovers from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            mutex.clear_poison();
            poisoned.into_inner()
        }
    }
}

/// Oracle that answers each prompt kind from a queue of canned replies.
///
/// The last reply queued for a kind is repeated once the queue drains; a
/// kind with no replies fails with a response error.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<HashMap<PromptKind, VecDeque<String>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` for `kind`.
    #[must_use]
    pub fn reply(self, kind: PromptKind, reply: impl Into<String>) -> Self {
        self.push(kind, reply);
        self
    }

    /// Queues `reply` for `kind` on a shared oracle.
    pub fn push(&self, kind: PromptKind, reply: impl Into<String>) {
        lock(&self.replies)
            .entry(kind)
            .or_default()
            .push_back(reply.into());
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<OracleRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received for `kind`.
    #[must_use]
    pub fn calls(&self, kind: PromptKind) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.prompt_kind == kind)
            .count()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        lock(&self.requests).push(request.clone());
        let mut replies = lock(&self.replies);
        let queue = replies
            .get_mut(&request.prompt_kind)
            .ok_or_else(|| {
                OracleError::Response(format!("no reply scripted for {}", request.prompt_kind.as_str()))
            })?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.ok_or_else(|| OracleError::Response("reply queue is empty".to_string()))
    }
}

/// Delivery provider that records requests and accepts or rejects them.
#[derive(Default)]
pub struct RecordingDeliveryProvider {
    rejection: Option<String>,
    delivered: Mutex<Vec<DeliveryParams>>,
}

impl RecordingDeliveryProvider {
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            delivered: Mutex::default(),
        }
    }

    #[must_use]
    pub fn delivered(&self) -> Vec<DeliveryParams> {
        lock(&self.delivered).clone()
    }
}

#[async_trait]
impl DeliveryProvider for RecordingDeliveryProvider {
    async fn deliver(&self, params: &DeliveryParams) -> Result<DeliveryReceipt, DeliveryError> {
        lock(&self.delivered).push(params.clone());
        match &self.rejection {
            Some(reason) => Err(DeliveryError::Rejected(reason.clone())),
            None => Ok(DeliveryReceipt {
                provider_message_id: Some(format!("provider-{}", lock(&self.delivered).len())),
            }),
        }
    }
}

fn contact(name: &str, email: &str) -> ContactRecord {
    ContactRecord {
        name: name.to_string(),
        email: Some(email.to_string()),
        phone: None,
    }
}

/// Directory with a handful of known people, including an ambiguous name.
#[must_use]
pub fn seeded_directory() -> InMemoryContactDirectory {
    InMemoryContactDirectory::new(vec![
        contact("John Smith", "john@x.com"),
        contact("Jane Doe", "jane@x.com"),
        contact("Alex Kim", "alex.kim@x.com"),
        contact("Alex Park", "alex.park@x.com"),
    ])
}

/// In-memory store, scripted oracle and seeded directory wired together.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub oracle: Arc<ScriptedOracle>,
    pub drafts: Arc<DraftService>,
    pub router: ConversationRouter,
}

impl Harness {
    #[must_use]
    pub fn new(oracle: ScriptedOracle) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let oracle = Arc::new(oracle);
        let drafts = Arc::new(DraftService::new(
            store.clone(),
            ContactResolver::new(Arc::new(seeded_directory()), 5),
            Arc::new(HeuristicContentResolver::new(3)),
        ));
        let adapter = OracleAdapter::new(oracle.clone(), chrono_tz::Tz::UTC, 12);
        let router = ConversationRouter::new(drafts.clone(), adapter, 0.5);
        Self {
            store,
            oracle,
            drafts,
            router,
        }
    }
}

/// An unanchored turn with no history.
#[must_use]
pub fn turn(thread_id: &str, message_id: &str, text: &str) -> Turn {
    Turn {
        thread_id: thread_id.to_string(),
        message_id: message_id.to_string(),
        user_message: text.to_string(),
        history: Vec::new(),
        anchor: None,
    }
}

/// A turn anchored to a draft.
#[must_use]
pub fn anchored_turn(
    thread_id: &str,
    message_id: &str,
    text: &str,
    draft_id: uuid::Uuid,
    history: Vec<ConversationTurn>,
) -> Turn {
    Turn {
        history,
        anchor: Some(AnchoredItem {
            item_type: "draft".to_string(),
            item_id: draft_id.to_string(),
            snapshot: None,
        }),
        ..turn(thread_id, message_id, text)
    }
}
