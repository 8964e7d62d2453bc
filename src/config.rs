//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety
//!
//! The resolved configuration is turned into an explicit
//! [`AnalysisOptions`] value before the pipeline runs; nothing in the
//! analysis core reads configuration or the environment on its own.

use crate::models::{AnalysisOptions, Scope, Window};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
///
/// Sections and fields missing from a config file keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Default analysis options
    pub analysis: AnalysisConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// Parse cache configuration
    pub cache: CacheConfig,

    /// Report delivery configuration
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

/// Whether a run covers one client or all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeChoice {
    Single,
    All,
}

/// Selectors take the same forms in files as in the environment:
/// `window = "peak"`, `window = "1"` and `window = 1` are equivalent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    #[serde(deserialize_with = "deserialize_window")]
    pub window: Window,
    #[serde(deserialize_with = "deserialize_scope")]
    pub scope: ScopeChoice,
    pub target_ip: Option<String>,
    /// Analyse this day instead of the most recent one in the log
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_file: PathBuf,
    pub output_dir: PathBuf,
    pub cache_file: PathBuf,
    pub log_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: Window::Full,
            scope: ScopeChoice::All,
            target_ip: None,
            date: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("querylog.json"),
            output_dir: PathBuf::from("."),
            cache_file: PathBuf::from("parsed_log_cache.json"),
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            analysis: AnalysisConfig::default(),
            paths: PathsConfig::default(),
            cache: CacheConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// A selector as written in a config file: a name or a menu number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Selector {
    Number(i64),
    Text(String),
}

impl Selector {
    fn into_text(self) -> String {
        match self {
            Selector::Number(n) => n.to_string(),
            Selector::Text(s) => s,
        }
    }
}

fn deserialize_window<'de, D>(deserializer: D) -> std::result::Result<Window, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let selector = Selector::deserialize(deserializer)?;
    parse_window(&selector.into_text()).map_err(serde::de::Error::custom)
}

fn deserialize_scope<'de, D>(deserializer: D) -> std::result::Result<ScopeChoice, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let selector = Selector::deserialize(deserializer)?;
    parse_scope(&selector.into_text()).map_err(serde::de::Error::custom)
}

/// Parse a window selector: `peak`/`1` or `full`/`2`.
pub fn parse_window(value: &str) -> Result<Window> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "peak" => Ok(Window::Peak),
        "2" | "full" => Ok(Window::Full),
        other => anyhow::bail!("Invalid window '{}': expected peak (1) or full (2)", other),
    }
}

/// Parse a scope selector: `single`/`1` or `all`/`2`.
pub fn parse_scope(value: &str) -> Result<ScopeChoice> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "single" => Ok(ScopeChoice::Single),
        "2" | "all" => Ok(ScopeChoice::All),
        other => anyhow::bail!("Invalid scope '{}': expected single (1) or all (2)", other),
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("querylog-analyzer.toml"),
            PathBuf::from(".querylog-analyzer.toml"),
            dirs::config_dir()
                .map(|d| d.join("querylog-analyzer").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Analysis overrides, named as in the scheduled-job setup
        if let Ok(val) = env::var("ANALYSIS_TIME_CHOICE") {
            self.analysis.window = parse_window(&val).context("Invalid ANALYSIS_TIME_CHOICE")?;
        }
        if let Ok(val) = env::var("ANALYSIS_IP_CHOICE") {
            self.analysis.scope = parse_scope(&val).context("Invalid ANALYSIS_IP_CHOICE")?;
        }
        if let Ok(val) = env::var("ANALYSIS_TARGET_IP") {
            if !val.trim().is_empty() {
                self.analysis.target_ip = Some(val.trim().to_string());
            }
        }
        if let Ok(val) = env::var("ANALYSIS_DATE") {
            let date = NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d")
                .context("Invalid ANALYSIS_DATE, use YYYY-MM-DD")?;
            self.analysis.date = Some(date);
        }

        // Path overrides
        if let Ok(val) = env::var("QUERYLOG_PATH") {
            self.paths.log_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUERYLOG_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUERYLOG_CACHE_PATH") {
            self.paths.cache_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUERYLOG_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        // Cache overrides
        if let Ok(val) = env::var("QUERYLOG_CACHE_ENABLED") {
            self.cache.enabled = val.parse()
                .context("Invalid QUERYLOG_CACHE_ENABLED")?;
        }

        // Delivery overrides
        if let Ok(val) = env::var("QUERYLOG_DELIVERY_URL") {
            self.delivery.enabled = !val.trim().is_empty();
            self.delivery.endpoint = val.trim().to_string();
        }
        if let Ok(val) = env::var("QUERYLOG_DELIVERY_TIMEOUT_SECS") {
            self.delivery.timeout_secs = val.parse()
                .context("Invalid QUERYLOG_DELIVERY_TIMEOUT_SECS")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.analysis.scope == ScopeChoice::Single
            && self.analysis.target_ip.as_deref().map_or(true, |ip| ip.trim().is_empty())
        {
            return Err(anyhow::anyhow!(
                "Single-client analysis needs a target IP (--client or ANALYSIS_TARGET_IP)"
            ));
        }

        if self.delivery.enabled {
            let endpoint = self.delivery.endpoint.as_str();
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "Delivery endpoint must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }

        if self.delivery.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Delivery timeout must be greater than 0"));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            warn!(format = %self.logging.format, "Unknown log format, using pretty");
        }

        // Log directory is only needed when logging to a file
        if self.logging.output != "console" && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Resolve the analysis options this configuration describes.
    pub fn analysis_options(&self) -> Result<AnalysisOptions> {
        let scope = match self.analysis.scope {
            ScopeChoice::All => Scope::AllEntities,
            ScopeChoice::Single => {
                let target = self
                    .analysis
                    .target_ip
                    .as_deref()
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .context("Single-client analysis needs a target IP")?;
                Scope::SingleEntity(target.to_string())
            }
        };

        Ok(AnalysisOptions {
            window: self.analysis.window,
            scope,
            pinned_date: self.analysis.date,
        })
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
