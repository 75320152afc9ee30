#![allow(clippy::unused_async, clippy::expect_used)]
//! Tests for wiring the application from settings.

use std::sync::Arc;

use serde_json::json;

use drafter_app::bootstrap::build_with_oracle;
use drafter_core::config::Settings;

use super::helpers::*;

fn settings_with(overrides: &[(&str, &str)]) -> Settings {
    let mut builder = Settings::builder().expect("defaults should apply");
    for (key, value) in overrides {
        builder = builder
            .set_override(*key, *value)
            .expect("override should apply");
    }
    builder
        .build()
        .expect("config should build")
        .try_deserialize::<Settings>()
        .expect("config should deserialize")
}

/// ## Summary
/// The default in-memory configuration routes turns against a contact file.
#[test_log::test(tokio::test)]
async fn builds_in_memory_app_from_settings() {
    let path = std::env::temp_dir().join(format!("drafter-contacts-{}.json", uuid::Uuid::now_v7()));
    let contacts = json!([{ "name": "Priya Nair", "email": "priya@x.com" }]);
    tokio::fs::write(&path, contacts.to_string())
        .await
        .expect("write contacts");
    let path_str = path.to_string_lossy().to_string();

    let settings = settings_with(&[("contacts.path", path_str.as_str())]);
    let oracle = ScriptedOracle::new().reply(
        PromptKind::CreationIntent,
        creation_reply("email", &json!({"to_contacts": ["Priya"]})),
    );
    let app = build_with_oracle(&settings, Arc::new(oracle))
        .await
        .expect("app builds");
    assert!(app.delivery.is_none());

    let outcome = expect_draft(app.router.route(&turn("t1", "m1", "email Priya")).await);
    let email = outcome.draft.as_email().expect("email payload");
    assert_eq!(email.to_emails, vec![resolved("priya@x.com", "Priya Nair")]);
    assert_eq!(outcome.completeness.missing_fields, vec!["subject", "body"]);

    tokio::fs::remove_file(&path).await.expect("remove contacts");
}

/// ## Summary
/// Selecting Postgres without a database section fails before connecting.
#[test_log::test(tokio::test)]
async fn postgres_backend_requires_database_section() {
    let settings = settings_with(&[("store.backend", "postgres")]);

    let result = build_with_oracle(&settings, Arc::new(ScriptedOracle::new())).await;

    let Err(err) = result else {
        panic!("expected a configuration error");
    };
    assert!(err.to_string().contains("[database]"), "{err}");
}
