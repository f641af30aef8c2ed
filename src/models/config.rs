//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Bot credential, recipients and command polling
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Upstream search request settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Periodic trigger timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Courtesy delays between remote calls
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Message rendering settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_IDS`
    /// (comma-separated), `CHECK_INTERVAL` (seconds), `SENT_POSTS_FILE`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(ids) = lookup("TELEGRAM_CHAT_IDS") {
            self.telegram.chat_ids = parse_chat_ids(&ids);
        }
        if let Some(raw) = lookup("CHECK_INTERVAL") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.schedule.interval_secs = secs,
                Err(e) => log::warn!("Ignoring invalid CHECK_INTERVAL {:?}: {}", raw, e),
            }
        }
        if let Some(path) = lookup("SENT_POSTS_FILE") {
            self.paths.state_file = PathBuf::from(path.trim());
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.search.user_agent.trim().is_empty() {
            return Err(AppError::validation("search.user_agent is empty"));
        }
        if self.search.timeout_secs == 0 {
            return Err(AppError::validation("search.timeout_secs must be > 0"));
        }
        if self.search.max_pages == Some(0) {
            return Err(AppError::validation("search.max_pages must be > 0 when set"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.schedule.failure_backoff_secs == 0 {
            return Err(AppError::validation(
                "schedule.failure_backoff_secs must be > 0",
            ));
        }
        if self.telegram.poll_timeout_secs == 0 {
            return Err(AppError::validation(
                "telegram.poll_timeout_secs must be > 0",
            ));
        }
        Url::parse(&self.search.api_url)
            .map_err(|e| AppError::validation(format!("search.api_url: {e}")))?;
        Url::parse(&self.telegram.api_base_url)
            .map_err(|e| AppError::validation(format!("telegram.api_base_url: {e}")))?;
        Url::parse(&self.notify.post_base_url)
            .map_err(|e| AppError::validation(format!("notify.post_base_url: {e}")))?;
        if self.paths.state_file.as_os_str().is_empty() {
            return Err(AppError::validation("paths.state_file is empty"));
        }
        Ok(())
    }

    /// The only fatal startup check: a bot token and at least one recipient.
    pub fn require_credentials(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::config("TELEGRAM_BOT_TOKEN is required"));
        }
        if self.telegram.chat_ids.is_empty() {
            return Err(AppError::config("TELEGRAM_CHAT_IDS is required"));
        }
        Ok(())
    }
}

/// Split a comma-separated chat id list, dropping blanks.
pub fn parse_chat_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    #[serde(default)]
    pub bot_token: String,

    /// Recipient chat ids, numeric or `@channel`
    #[serde(default)]
    pub chat_ids: Vec<String>,

    /// Bot API base URL
    #[serde(default = "defaults::telegram_api")]
    pub api_base_url: String,

    /// Whether to answer `/check` and friends via long polling
    #[serde(default = "defaults::poll_commands")]
    pub poll_commands: bool,

    /// Long-poll timeout for `getUpdates`
    #[serde(default = "defaults::poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_ids: Vec::new(),
            api_base_url: defaults::telegram_api(),
            poll_commands: defaults::poll_commands(),
            poll_timeout_secs: defaults::poll_timeout(),
        }
    }
}

/// Upstream search API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint (HTTP POST)
    #[serde(default = "defaults::search_api")]
    pub api_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// City ids sent with every request
    #[serde(default = "defaults::city_ids")]
    pub city_ids: Vec<String>,

    /// Opaque filter payload (category, price ceilings, bounding box, sort)
    #[serde(default = "defaults::filter")]
    pub filter: serde_json::Value,

    /// Optional cap on pages per traversal
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Human-readable lines describing the search, shown by `/info`
    #[serde(default = "defaults::summary_lines")]
    pub summary_lines: Vec<String>,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::search_api(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            city_ids: defaults::city_ids(),
            filter: defaults::filter(),
            max_pages: None,
            summary_lines: defaults::summary_lines(),
        }
    }
}

/// Periodic trigger timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between checks
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Seconds before the first check
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_secs: u64,

    /// First retry delay after a failed cycle; doubles up to the interval
    #[serde(default = "defaults::failure_backoff")]
    pub failure_backoff_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            initial_delay_secs: defaults::initial_delay(),
            failure_backoff_secs: defaults::failure_backoff(),
        }
    }
}

/// Courtesy delays in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay before each follow-up page request
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Delay between delivered listings
    #[serde(default = "defaults::listing_delay")]
    pub listing_delay_ms: u64,

    /// Delay between recipients of one listing
    #[serde(default = "defaults::recipient_delay")]
    pub recipient_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: defaults::page_delay(),
            listing_delay_ms: defaults::listing_delay(),
            recipient_delay_ms: defaults::recipient_delay(),
        }
    }
}

/// Message rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base for listing deep links; the post token is appended
    #[serde(default = "defaults::post_base")]
    pub post_base_url: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            post_base_url: defaults::post_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON array of already-sent post tokens
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use serde_json::json;

    // Telegram defaults
    pub fn telegram_api() -> String {
        "https://api.telegram.org".into()
    }
    pub fn poll_commands() -> bool {
        true
    }
    pub fn poll_timeout() -> u64 {
        30
    }

    // Search defaults
    pub fn search_api() -> String {
        "https://api.divar.ir/v8/postlist/w/search".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn city_ids() -> Vec<String> {
        vec!["1".into()]
    }
    pub fn filter() -> serde_json::Value {
        json!({
            "form_data": {
                "data": {
                    "category": { "str": { "value": "residential-rent" } },
                    "credit": { "number_range": { "maximum": "2000000000" } },
                    "rent": { "number_range": { "maximum": "130000000" } },
                    "bbox": {
                        "repeated_float": {
                            "value": [
                                { "value": 51.2 },
                                { "value": 35.55 },
                                { "value": 51.6 },
                                { "value": 35.85 }
                            ]
                        }
                    }
                }
            },
            "server_payload": {
                "@type": "type.googleapis.com/widgets.SearchData.ServerPayload",
                "additional_form_data": {
                    "data": { "sort": { "str": { "value": "sort_date" } } }
                }
            }
        })
    }
    pub fn summary_lines() -> Vec<String> {
        vec![
            "📍 <b>Search Area:</b> Tehran".into(),
            "💰 <b>Max Price:</b> 200,000,000 Tomans".into(),
            "🏠 <b>Max Rent:</b> 13,000,000 Tomans".into(),
        ]
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        900
    }
    pub fn initial_delay() -> u64 {
        10
    }
    pub fn failure_backoff() -> u64 {
        60
    }

    // Pacing defaults
    pub fn page_delay() -> u64 {
        2000
    }
    pub fn listing_delay() -> u64 {
        1000
    }
    pub fn recipient_delay() -> u64 {
        500
    }

    pub fn post_base() -> String {
        "https://divar.ir/v".into()
    }
    pub fn state_file() -> PathBuf {
        PathBuf::from("sent_posts.json")
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_api_url() {
        let mut config = Config::default();
        config.search.api_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_lacks_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.require_credentials(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("TELEGRAM_BOT_TOKEN", " 123:abc "),
            ("TELEGRAM_CHAT_IDS", "111, ,@news,222"),
            ("CHECK_INTERVAL", "300"),
            ("SENT_POSTS_FILE", "/var/lib/notifier/seen.json"),
        ]));

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_ids, vec!["111", "@news", "222"]);
        assert_eq!(config.schedule.interval_secs, 300);
        assert_eq!(
            config.paths.state_file,
            PathBuf::from("/var/lib/notifier/seen.json")
        );
        assert!(config.require_credentials().is_ok());
    }

    #[test]
    fn invalid_interval_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("CHECK_INTERVAL", "soon")]));
        assert_eq!(config.schedule.interval_secs, 900);
    }

    #[test]
    fn parses_toml_with_partial_sections() {
        let toml = r#"
            [telegram]
            bot_token = "t"
            chat_ids = ["1"]

            [schedule]
            interval_secs = 60

            [search.filter.form_data.data.category.str]
            value = "apartment-rent"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.schedule.interval_secs, 60);
        assert_eq!(config.schedule.initial_delay_secs, 10);
        assert_eq!(config.pacing.recipient_delay_ms, 500);
        assert_eq!(
            config.search.filter["form_data"]["data"]["category"]["str"]["value"],
            "apartment-rent"
        );
    }

    #[test]
    fn example_config_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.search.filter, defaults.search.filter);
        assert_eq!(config.search.summary_lines, defaults.search.summary_lines);
        assert_eq!(config.schedule.interval_secs, defaults.schedule.interval_secs);
        assert!(config.validate().is_ok());
    }
}
