use std::sync::Arc;

use anyhow::Context;

use drafter_core::config::{Settings, StoreBackend};
use drafter_db::db::DocumentStore;
use drafter_db::db::connection::{create_pool, run_migrations};
use drafter_db::db::store::{InMemoryStore, PgDocumentStore};
use drafter_service::contact::{ContactDirectory, ContactResolver, InMemoryContactDirectory};
use drafter_service::delivery::{DeliveryProvider, WebhookDeliveryProvider};
use drafter_service::draft::{DraftService, HeuristicContentResolver};
use drafter_service::oracle::{ChatCompletionsOracle, Oracle, OracleAdapter};
use drafter_service::router::ConversationRouter;

/// Everything a session needs, wired from configuration.
pub struct App {
    pub router: ConversationRouter,
    /// `None` when no delivery endpoint is configured.
    pub delivery: Option<Arc<dyn DeliveryProvider>>,
}

/// ## Summary
/// Opens the configured document store.
///
/// ## Side Effects
/// For the Postgres backend, creates a pool and applies pending migrations.
///
/// ## Errors
/// Returns an error if the Postgres backend is selected without a
/// `[database]` section, or connecting or migrating fails.
pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory draft store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let database = settings
                .database
                .as_ref()
                .context("store.backend is postgres but [database] is not configured")?;
            run_migrations(&database.url).await?;
            let pool = create_pool(&database.url, u32::from(database.max_connections)).await?;
            tracing::info!("Using Postgres draft store");
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
    }
}

/// ## Summary
/// Loads the contact directory, empty when no file is configured.
///
/// ## Errors
/// Returns an error if the configured file cannot be read or parsed.
pub async fn open_directory(settings: &Settings) -> anyhow::Result<Arc<dyn ContactDirectory>> {
    let directory = match &settings.contacts.path {
        Some(path) => InMemoryContactDirectory::from_json_file(path)
            .await
            .with_context(|| format!("failed to load contacts from {path}"))?,
        None => {
            tracing::warn!("No contacts file configured; names will need clarification");
            InMemoryContactDirectory::default()
        }
    };
    Ok(Arc::new(directory))
}

/// ## Summary
/// Builds the application from settings and the given oracle.
///
/// ## Errors
/// Returns an error if any collaborator fails to initialise.
pub async fn build_with_oracle(settings: &Settings, oracle: Arc<dyn Oracle>) -> anyhow::Result<App> {
    let timezone = settings.drafts.timezone()?;
    let store = open_store(settings).await?;
    let directory = open_directory(settings).await?;

    let drafts = Arc::new(DraftService::new(
        store,
        ContactResolver::new(directory, settings.contacts.search_limit),
        Arc::new(HeuristicContentResolver::new(settings.drafts.content_scan_turns)),
    ));
    let adapter = OracleAdapter::new(oracle, timezone, settings.drafts.history_window);
    let router = ConversationRouter::new(
        drafts,
        adapter,
        settings.drafts.update_confidence_threshold,
    );

    let delivery = match &settings.delivery.webhook_url {
        Some(url) => {
            let provider = WebhookDeliveryProvider::new(url.clone(), settings.delivery.timeout_secs)?;
            Some(Arc::new(provider) as Arc<dyn DeliveryProvider>)
        }
        None => {
            tracing::info!("No delivery webhook configured; sending is disabled");
            None
        }
    };

    Ok(App { router, delivery })
}

/// ## Summary
/// Builds the application with the configured chat-completions oracle.
///
/// ## Errors
/// Returns an error if any collaborator fails to initialise.
pub async fn build(settings: &Settings) -> anyhow::Result<App> {
    let oracle = ChatCompletionsOracle::new(&settings.oracle)?;
    build_with_oracle(settings, Arc::new(oracle)).await
}
