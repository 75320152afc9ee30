use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    pub oracle: OracleConfig,
    pub contacts: ContactsConfig,
    pub delivery: DeliveryConfig,
    pub drafts: DraftConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Clone, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API (e.g. `https://api.openai.com/v1`).
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OracleConfig {
    /// ## Summary
    /// Returns the chat completions URL for the configured endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactsConfig {
    /// JSON file with `[{name, email, phone?}]` entries.
    pub path: Option<String>,
    pub search_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Endpoint that receives delivery parameters as JSON. Delivery is
    /// disabled when unset.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    /// Number of recent assistant turns scanned for suggested content.
    pub content_scan_turns: usize,
    /// Number of trailing history turns forwarded to the oracle.
    pub history_window: usize,
    /// Update intents below this confidence are ignored.
    pub update_confidence_threshold: f32,
    /// IANA zone applied to oracle times without an explicit offset.
    pub default_timezone: String,
}

impl DraftConfig {
    /// ## Summary
    /// Parses the configured default time zone.
    ///
    /// ## Errors
    /// Returns an error if the zone name is not a known IANA identifier.
    pub fn timezone(&self) -> crate::error::CoreResult<chrono_tz::Tz> {
        self.default_timezone.parse::<chrono_tz::Tz>().map_err(|e| {
            crate::error::CoreError::ConfigError(format!(
                "invalid drafts.default_timezone '{}': {e}",
                self.default_timezone
            ))
        })
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            content_scan_turns: 3,
            history_window: 12,
            update_confidence_threshold: 0.5,
            default_timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::builder()?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Returns a builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be set.
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let drafts = DraftConfig::default();
        Ok(Config::builder()
            .set_default("store.backend", "memory")?
            .set_default("oracle.endpoint", "https://api.openai.com/v1")?
            .set_default("oracle.model", "gpt-4o-mini")?
            .set_default("oracle.timeout_secs", 30)?
            .set_default("oracle.temperature", 0.0)?
            .set_default("contacts.search_limit", 5)?
            .set_default("delivery.timeout_secs", 30)?
            .set_default(
                "drafts.content_scan_turns",
                u64::try_from(drafts.content_scan_turns).unwrap_or(3),
            )?
            .set_default(
                "drafts.history_window",
                u64::try_from(drafts.history_window).unwrap_or(12),
            )?
            .set_default(
                "drafts.update_confidence_threshold",
                f64::from(drafts.update_confidence_threshold),
            )?
            .set_default("drafts.default_timezone", drafts.default_timezone)?
            .set_default("logging.level", "debug")?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
