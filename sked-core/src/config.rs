//! Process-wide configuration.
//!
//! Loaded once at startup from `~/.config/sked/config.toml` (or an explicit
//! path) overlaid with `SKED__SECTION__KEY` environment variables, then passed
//! by value into the components. Nothing below the binaries reads the
//! environment on its own.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_PRODUCT_ID: &str = "-//SKED//Calendar//KO";
pub const DEFAULT_ALARM_MINUTES_BEFORE: u32 = 30;
pub const DEFAULT_DURATION_HOURS: u32 = 2;
pub const DEFAULT_FIRECRAWL_ENDPOINT: &str = "https://api.firecrawl.dev/v1/scrape";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkedConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Language-model settings for structured extraction.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on one provider call
    #[serde(default = "default_extract_timeout_secs")]
    pub timeout_secs: u64,
}

/// Calendar rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_product_id")]
    pub product_id: String,

    #[serde(default = "default_alarm_minutes_before")]
    pub alarm_minutes_before: u32,

    /// Assumed length of an event, since extraction yields no end time
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u32,

    /// X-WR-CALNAME shown by importing clients
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    #[serde(default = "default_alarm_description")]
    pub alarm_description: String,
}

/// Page-text acquisition (Firecrawl) settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_firecrawl_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_scrape_timeout_secs")]
    pub timeout_secs: u64,
}

/// Backoff around extraction, applied by the orchestrating layer only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; any origin when unset
    #[serde(default)]
    pub cors_origin: Option<String>,

    /// Bearer token required on /api routes; auth is off when unset
    #[serde(default, skip_serializing)]
    pub api_secret: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_base_url() -> String {
    crate::extract::DEFAULT_BASE_URL.to_string()
}

fn default_extract_timeout_secs() -> u64 {
    30
}

fn default_product_id() -> String {
    DEFAULT_PRODUCT_ID.to_string()
}

fn default_alarm_minutes_before() -> u32 {
    DEFAULT_ALARM_MINUTES_BEFORE
}

fn default_duration_hours() -> u32 {
    DEFAULT_DURATION_HOURS
}

fn default_calendar_name() -> String {
    "일정".to_string()
}

fn default_alarm_description() -> String {
    "알림".to_string()
}

fn default_firecrawl_endpoint() -> String {
    DEFAULT_FIRECRAWL_ENDPOINT.to_string()
}

fn default_scrape_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            timeout_secs: default_extract_timeout_secs(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            product_id: default_product_id(),
            alarm_minutes_before: default_alarm_minutes_before(),
            duration_hours: default_duration_hours(),
            calendar_name: default_calendar_name(),
            alarm_description: default_alarm_description(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_firecrawl_endpoint(),
            timeout_secs: default_scrape_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
            api_secret: None,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for ScraperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origin", &self.cors_origin)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Well-known provider keys read as fallbacks for the config file.
#[derive(Debug, Default, Clone)]
pub struct KeyFallbacks {
    pub openai_api_key: Option<String>,
    pub firecrawl_api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl KeyFallbacks {
    /// Read `OPENAI_API_KEY`, `FIRECRAWL_API_KEY` and `SKED_API_SECRET`.
    ///
    /// Only the binaries call this, once, at startup.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            firecrawl_api_key: var("FIRECRAWL_API_KEY"),
            api_secret: var("SKED_API_SECRET"),
        }
    }
}

impl SkedConfig {
    /// `~/.config/sked/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".into()))?
            .join("sked");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location) plus `SKED__*` variables.
    ///
    /// A missing file is not an error; every key has a default.
    pub fn load(path: Option<&Path>, fallbacks: KeyFallbacks) -> ConfigResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let config: SkedConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SKED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config.with_fallbacks(fallbacks))
    }

    /// Parse TOML text directly, without file or environment layers.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Fill keys the file left empty.
    pub fn with_fallbacks(mut self, fallbacks: KeyFallbacks) -> Self {
        if self.extractor.api_key.is_none() {
            self.extractor.api_key = fallbacks.openai_api_key;
        }
        if self.scraper.api_key.is_none() {
            self.scraper.api_key = fallbacks.firecrawl_api_key;
        }
        if self.server.api_secret.is_none() {
            self.server.api_secret = fallbacks.api_secret;
        }
        self
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> ConfigResult<()> {
        let contents = format!(
            "\
# sked configuration

[extractor]
# api_key = \"sk-...\"          # or set OPENAI_API_KEY
# model = \"{DEFAULT_MODEL}\"
# max_tokens = {DEFAULT_MAX_TOKENS}
# timeout_secs = 30

[calendar]
# product_id = \"{DEFAULT_PRODUCT_ID}\"
# alarm_minutes_before = {DEFAULT_ALARM_MINUTES_BEFORE}
# duration_hours = {DEFAULT_DURATION_HOURS}

[scraper]
# api_key = \"fc-...\"          # or set FIRECRAWL_API_KEY

[retry]
# max_attempts = 3

[server]
# port = 3001
# cors_origin = \"https://example.com\"
# api_secret = \"...\"          # or set SKED_API_SECRET
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SkedConfig::default();
        assert_eq!(config.extractor.model, "gpt-4o-mini");
        assert_eq!(config.extractor.max_tokens, 500);
        assert_eq!(config.calendar.product_id, "-//SKED//Calendar//KO");
        assert_eq!(config.calendar.alarm_minutes_before, 30);
        assert_eq!(config.calendar.duration_hours, 2);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.server.api_secret.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SkedConfig::from_toml(
            r#"
            [calendar]
            duration_hours = 3

            [extractor]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.calendar.duration_hours, 3);
        assert_eq!(config.calendar.alarm_minutes_before, 30);
        assert_eq!(config.extractor.model, "gpt-4o");
        assert_eq!(config.extractor.max_tokens, 500);
    }

    #[test]
    fn fallbacks_only_fill_missing_keys() {
        let config = SkedConfig::from_toml("[extractor]\napi_key = \"from-file\"\n")
            .unwrap()
            .with_fallbacks(KeyFallbacks {
                openai_api_key: Some("from-env".into()),
                firecrawl_api_key: Some("fc-env".into()),
                api_secret: None,
            });
        assert_eq!(config.extractor.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.scraper.api_key.as_deref(), Some("fc-env"));
        assert!(config.server.api_secret.is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = SkedConfig::default().with_fallbacks(KeyFallbacks {
            openai_api_key: Some("sk-very-secret".into()),
            ..KeyFallbacks::default()
        });
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config = SkedConfig::load(Some(&missing), KeyFallbacks::default()).unwrap();
        assert_eq!(config.calendar.duration_hours, 2);

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[calendar]\nalarm_minutes_before = 10\n").unwrap();
        let config = SkedConfig::load(Some(&path), KeyFallbacks::default()).unwrap();
        assert_eq!(config.calendar.alarm_minutes_before, 10);
    }

    #[test]
    fn default_config_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sked").join("config.toml");
        SkedConfig::create_default_config(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let config = SkedConfig::from_toml(&contents).unwrap();
        assert_eq!(config.calendar, CalendarConfig::default());
    }

    #[test]
    fn default_config_under_a_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("sked");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = SkedConfig::create_default_config(&blocker.join("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "{err:?}");
    }
}
