//! # Desk Configuration
//!
//! Configuration loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ARB_DB_PATH=/tmp/desk.db                                           │
//! │     ARB_FEE_BPS=1000                                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $ARB_CONFIG, or                                                    │
//! │     ~/.config/desk/desk.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.arbdesk.desk/desk.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     12% fee, 200 summary lines, built-in keyword table                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # desk.toml
//! [database]
//! path = "/data/desk.db"
//!
//! [matching]
//! fee_bps = 1200        # platform fee, 1200 = 12%
//! summary_limit = 200   # lines sent to the assistant
//!
//! [assistant]
//! url = "https://assistant.example.com/v1/ask"
//! api_key = "sk-..."
//! timeout_secs = 60
//!
//! [keywords]
//! sku = ["货号", "款号", "Style Code"]
//! ```
//!
//! A `[keywords]` list replaces the built-in list for that role only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use arb_core::{FeeRate, KeywordTable, DEFAULT_FEE_BPS, SUMMARY_LIMIT};

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// `[matching]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Platform fee in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,

    /// Result lines handed to the assistant.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

fn default_fee_bps() -> u32 {
    DEFAULT_FEE_BPS
}

fn default_summary_limit() -> usize {
    SUMMARY_LIMIT
}

impl Default for MatchingSettings {
    fn default() -> Self {
        MatchingSettings {
            fee_bps: default_fee_bps(),
            summary_limit: default_summary_limit(),
        }
    }
}

/// `[assistant]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    /// Endpoint accepting `{summary, question}`. Unset disables `ask`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Sent as a bearer token when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for AssistantSettings {
    fn default() -> Self {
        AssistantSettings {
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// Desk Config
// =============================================================================

/// Complete desk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub matching: MatchingSettings,

    #[serde(default)]
    pub assistant: AssistantSettings,

    #[serde(default)]
    pub keywords: KeywordTable,
}

impl DeskConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`desk.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("ARB_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading desk config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.matching.fee_bps >= 10_000 {
            return Err(ConfigError::Invalid(format!(
                "fee_bps must be below 10000, got {}",
                self.matching.fee_bps
            )));
        }

        if self.matching.summary_limit == 0 || self.matching.summary_limit > SUMMARY_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "summary_limit must be between 1 and {}, got {}",
                SUMMARY_LIMIT, self.matching.summary_limit
            )));
        }

        if let Some(ref url) = self.assistant.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "Assistant URL must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if self.assistant.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "assistant timeout_secs must be greater than 0".into(),
            ));
        }

        if self.keywords.sku.is_empty() {
            return Err(ConfigError::Invalid(
                "keywords.sku must list at least one synonym".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment
    /// in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ARB_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(fee) = lookup("ARB_FEE_BPS") {
            match fee.parse::<u32>() {
                Ok(bps) => self.matching.fee_bps = bps,
                Err(_) => warn!(value = %fee, "Ignoring non-numeric ARB_FEE_BPS"),
            }
        }

        if let Some(limit) = lookup("ARB_SUMMARY_LIMIT") {
            match limit.parse::<usize>() {
                Ok(n) => self.matching.summary_limit = n,
                Err(_) => warn!(value = %limit, "Ignoring non-numeric ARB_SUMMARY_LIMIT"),
            }
        }

        if let Some(url) = lookup("ARB_ASSISTANT_URL") {
            debug!(url = %url, "Overriding assistant URL from environment");
            self.assistant.url = Some(url);
        }

        if let Some(key) = lookup("ARB_ASSISTANT_KEY") {
            self.assistant.api_key = Some(key);
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "arbdesk", "desk")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("desk.toml"))
    }

    /// Resolves the SQLite file, creating its directory when needed.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.arbdesk.desk/desk.db`
    /// - **Windows**: `%APPDATA%\arbdesk\desk\data\desk.db`
    /// - **Linux**: `~/.local/share/desk/desk.db`
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        let path = match self.database.path {
            Some(ref path) => path.clone(),
            None => Self::project_dirs()
                .ok_or(ConfigError::NoDataDir)?
                .data_dir()
                .join("desk.db"),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(path)
    }

    pub fn fee(&self) -> FeeRate {
        FeeRate::from_bps(self.matching.fee_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DeskConfig::default();
        assert_eq!(config.matching.fee_bps, 1200);
        assert_eq!(config.matching.summary_limit, 200);
        assert!(config.assistant.url.is_none());
        assert!(config.keywords.sku.contains(&"货号".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DeskConfig::from_toml(
            r#"
            [matching]
            fee_bps = 800

            [keywords]
            price = ["进价"]
            "#,
        )
        .unwrap();

        assert_eq!(config.fee().bps(), 800);
        assert_eq!(config.matching.summary_limit, 200);
        assert_eq!(config.keywords.price, vec!["进价"]);
        assert!(config.keywords.sku.contains(&"款号".to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ARB_DB_PATH", "/tmp/desk-test.db"),
            ("ARB_FEE_BPS", "1000"),
            ("ARB_SUMMARY_LIMIT", "oops"),
            ("ARB_ASSISTANT_URL", "https://assistant.test/ask"),
        ]);

        let mut config = DeskConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/desk-test.db")));
        assert_eq!(config.matching.fee_bps, 1000);
        assert_eq!(config.matching.summary_limit, 200);
        assert_eq!(config.assistant.url.as_deref(), Some("https://assistant.test/ask"));
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DeskConfig::default();
        config.matching.fee_bps = 10_000;
        assert!(config.validate().is_err());

        let mut config = DeskConfig::default();
        config.matching.summary_limit = 500;
        assert!(config.validate().is_err());

        let mut config = DeskConfig::default();
        config.assistant.url = Some("ftp://nope".into());
        assert!(config.validate().is_err());

        let mut config = DeskConfig::default();
        config.keywords.sku.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let err = DeskConfig::from_toml("[matching]\nfee_bps = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_serialization() {
        let config = DeskConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = DeskConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
