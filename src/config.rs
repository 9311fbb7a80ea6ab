//! Configuration management for reelscout using the prefer crate.
//!
//! Resolution order: built-in defaults, then the config file (explicit path or
//! discovered by prefer), then environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crawler::BackoffPolicy;
use crate::models::{Partition, PartitionSpec};
use crate::remote::DEFAULT_BASE_URL;

/// Default table filename inside the data directory.
pub const DEFAULT_TABLE_FILE: &str = "movies.csv";

/// Default number of discover pages per language.
pub const DEFAULT_PAGES_PER_LANGUAGE: u32 = 10;

/// Languages crawled when the config does not list any.
pub const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("it", "Italian"),
    ("bn", "Bengali"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("zh", "Chinese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("pt", "Portuguese"),
    ("tr", "Turkish"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("pl", "Polish"),
    ("nl", "Dutch"),
    ("th", "Thai"),
    ("id", "Indonesian"),
    ("vi", "Vietnamese"),
    ("el", "Greek"),
    ("cs", "Czech"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("fa", "Persian"),
    ("he", "Hebrew"),
    ("ur", "Urdu"),
];

/// Environment variable holding the TMDb API key.
pub const ENV_API_KEY: &str = "TMDB_API_KEY";
/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "REELSCOUT_DATA_DIR";
/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "REELSCOUT_BASE_URL";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Table filename, relative to `data_dir`.
    pub table_file: String,
    /// TMDb API key.
    pub api_key: Option<String>,
    /// API root URL.
    pub base_url: String,
    /// User agent override.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay after each successful page fetch in milliseconds.
    pub request_delay_ms: u64,
    /// Pause after a rate-limit response in seconds.
    pub rate_limit_cooldown_secs: u64,
    /// Pages fetched per language.
    pub pages_per_language: u32,
    /// Languages to crawl, in order.
    pub languages: Vec<Partition>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reelscout");

        Self {
            data_dir,
            table_file: DEFAULT_TABLE_FILE.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 200,
            rate_limit_cooldown_secs: 60,
            pages_per_language: DEFAULT_PAGES_PER_LANGUAGE,
            languages: default_languages(),
        }
    }
}

fn default_languages() -> Vec<Partition> {
    DEFAULT_LANGUAGES
        .iter()
        .map(|(code, name)| Partition::new(*code, *name))
        .collect()
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Full path of the record table.
    pub fn table_path(&self) -> PathBuf {
        self.data_dir.join(&self.table_file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Page fetch timing derived from the configured delays.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            courtesy_delay: Duration::from_millis(self.request_delay_ms),
            rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown_secs),
        }
    }

    /// Configured languages as a crawl partition list.
    pub fn partition_spec(&self) -> PartitionSpec {
        PartitionSpec::new(self.languages.clone())
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(dir) = non_empty(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.base_url = url;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }
}

/// One configured language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct LanguageEntry {
    pub code: String,
    pub name: String,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Table filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_file: Option<String>,
    /// TMDb API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API root URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between page requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Pause after a rate-limit response in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_cooldown_secs: Option<u64>,
    /// Pages fetched per language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_per_language: Option<u32>,
    /// Languages to crawl, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub languages: Vec<LanguageEntry>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers reelscout config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("reelscout").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            // No config file found, use defaults
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref table_file) = self.table_file {
            settings.table_file = table_file.clone();
        }
        if let Some(ref api_key) = self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(cooldown) = self.rate_limit_cooldown_secs {
            settings.rate_limit_cooldown_secs = cooldown;
        }
        if let Some(pages) = self.pages_per_language {
            settings.pages_per_language = pages;
        }
        if !self.languages.is_empty() {
            settings.languages = self
                .languages
                .iter()
                .map(|l| Partition::new(l.code.clone(), l.name.clone()))
                .collect();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load settings from defaults, config file, environment and options.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env();

    if let Some(data_dir) = options.data_dir {
        settings.data_dir = data_dir;
    }

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    Ok(settings)
}
