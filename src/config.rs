//! Configuration loader and validator for the daily art poster.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::retry::Backoff;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub source: SourceSettings,
    pub publisher: PublisherSettings,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    #[serde(default = "default_terms_file")]
    pub terms_file: String,
}

fn default_terms_file() -> String {
    "config/artists_database.json".into()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TermSelection {
    #[default]
    Random,
    RoundRobin,
}

/// Queue sizing and replenishment budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueSettings {
    /// Replenish when fewer than this many posts are queued.
    pub min_size: usize,
    /// How many new posts one replenishment aims to add.
    pub growth: usize,
    /// Search terms tried before giving up on a replenishment.
    pub max_attempts: u32,
    /// Ids requested per search.
    pub search_limit: usize,
    /// Pause between successive generated candidates.
    pub fetch_delay_ms: u64,
    pub term_selection: TermSelection,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            min_size: 7,
            growth: 14,
            max_attempts: 50,
            search_limit: 20,
            fetch_delay_ms: 1000,
            term_selection: TermSelection::Random,
        }
    }
}

impl QueueSettings {
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetrySettings {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Met collection API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceSettings {
    pub base_url: String,
    /// 11 is European Paintings; `null` searches the whole collection.
    pub department_id: Option<u32>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://collectionapi.metmuseum.org/public/collection/v1/".into(),
            department_id: Some(11),
            timeout_secs: 15,
            user_agent: "daily-art-poster/0.1".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherKind {
    Facebook,
    Telegram,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublisherSettings {
    pub kind: PublisherKind,
    #[serde(default)]
    pub facebook: FacebookSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
}

/// Facebook page credentials. Either a page token, or a user token that is
/// exchanged for the page token at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FacebookSettings {
    pub page_id: String,
    pub page_access_token: String,
    pub user_access_token: String,
    pub graph_url: String,
    pub graph_version: String,
}

impl Default for FacebookSettings {
    fn default() -> Self {
        Self {
            page_id: String::new(),
            page_access_token: String::new(),
            user_access_token: String::new(),
            graph_url: "https://graph.facebook.com/".into(),
            graph_version: "v21.0".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: i64,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.data_dir())
    }

    /// `app.data_dir` with a leading `~/` expanded.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.app.data_dir)
    }

    pub fn terms_file(&self) -> PathBuf {
        expand_home(&self.app.terms_file)
    }

    /// Let credentials come from the environment instead of the file.
    fn apply_env(&mut self) {
        let fb = &mut self.publisher.facebook;
        override_from_env(&mut fb.page_id, "FB_PAGE_ID");
        override_from_env(&mut fb.page_access_token, "FB_PAGE_ACCESS_TOKEN");
        override_from_env(&mut fb.user_access_token, "FB_USER_ACCESS_TOKEN");
        override_from_env(&mut self.publisher.telegram.bot_token, "TELEGRAM_BOT_TOKEN");
    }
}

fn override_from_env(field: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *field = value;
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load configuration from a YAML file, apply environment overrides and
/// validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    let q = &cfg.queue;
    if q.min_size == 0 {
        return Err(ConfigError::Invalid("queue.min_size must be > 0"));
    }
    if q.growth == 0 {
        return Err(ConfigError::Invalid("queue.growth must be > 0"));
    }
    if q.max_attempts == 0 {
        return Err(ConfigError::Invalid("queue.max_attempts must be > 0"));
    }
    if q.search_limit == 0 {
        return Err(ConfigError::Invalid("queue.search_limit must be > 0"));
    }
    if cfg.retry.attempts == 0 {
        return Err(ConfigError::Invalid("retry.attempts must be > 0"));
    }

    if cfg.source.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("source.base_url must be non-empty"));
    }
    if cfg.source.timeout_secs == 0 {
        return Err(ConfigError::Invalid("source.timeout_secs must be > 0"));
    }

    match cfg.publisher.kind {
        PublisherKind::Facebook => {
            let fb = &cfg.publisher.facebook;
            if fb.page_id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "publisher.facebook.page_id must be non-empty",
                ));
            }
            if fb.page_access_token.trim().is_empty() && fb.user_access_token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "publisher.facebook needs page_access_token or user_access_token",
                ));
            }
            if fb.graph_version.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "publisher.facebook.graph_version must be non-empty",
                ));
            }
        }
        PublisherKind::Telegram => {
            let tg = &cfg.publisher.telegram;
            if tg.bot_token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "publisher.telegram.bot_token must be non-empty",
                ));
            }
            if tg.chat_id == 0 {
                return Err(ConfigError::Invalid(
                    "publisher.telegram.chat_id must be set",
                ));
            }
        }
    }

    Ok(())
}

/// Returns an example YAML configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  terms_file: "config/artists_database.json"

queue:
  min_size: 7
  growth: 14
  max_attempts: 50
  search_limit: 20
  fetch_delay_ms: 1000
  term_selection: random

retry:
  attempts: 3
  base_delay_ms: 500

source:
  base_url: "https://collectionapi.metmuseum.org/public/collection/v1/"
  department_id: 11
  timeout_secs: 15
  user_agent: "daily-art-poster/0.1"

publisher:
  kind: facebook
  facebook:
    page_id: "YOUR_PAGE_ID"
    page_access_token: "YOUR_PAGE_ACCESS_TOKEN"
    graph_version: "v21.0"
  telegram:
    bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
    chat_id: -1001234567890
"#
}
