//! Configuration management for Tributary.
//!
//! Configuration is read from `~/.config/tributary/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod overrides;

pub use overrides::{OverrideRules, OverrideSpec, OverrideStore};

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub ingest: IngestConfig,
    pub discovery: DiscoveryConfig,
    pub extractor: ExtractorConfig,
    /// Inline extractor overrides keyed by host.
    pub overrides: HashMap<String, OverrideSpec>,
}

/// HTTP settings shared by every network fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("tributary/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Entries kept from each poll, in feed order (default: 25)
    pub max_entries: usize,
    /// Per-entry stagger between article fetches in seconds (default: 5)
    pub stagger_secs: u64,
    /// Sources polled at once by `poll` (default: 10)
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_entries: 25,
            stagger_secs: 5,
            workers: 10,
        }
    }
}

impl IngestConfig {
    /// Delay before fetching the entry at `index`: `(index + 1) * stagger`.
    pub fn fetch_delay(&self, index: usize) -> Duration {
        Duration::from_secs((index as u64 + 1) * self.stagger_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Extra `host = "feed url"` pairs layered over the built-in feed table.
    pub feeds: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Directory of `<host>.json` override files.
    pub overrides_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/tributary/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tributary").join("config.toml"))
    }

    /// Compiles inline overrides and any override directory into one store.
    pub fn override_store(&self) -> Result<OverrideStore, ConfigError> {
        let mut store = OverrideStore::from_specs(&self.overrides)?;
        if let Some(ref dir) = self.extractor.overrides_dir {
            store.load_dir(dir)?;
        }
        Ok(store)
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Tributary Configuration

[fetcher]
# Request timeout in seconds
timeout_secs = 10

[ingest]
# Entries kept per poll, in feed order
max_entries = 25

# Seconds between consecutive article fetches after a poll
stagger_secs = 5

# Sources polled concurrently by `tributary poll`
workers = 10

[discovery.feeds]
# Known feed URLs by host, checked alongside autodiscovery
# "example.com" = "https://example.com/feed.xml"

[extractor]
# Directory of <host>.json files: {"whitelist": [...], "blacklist": [...]}
# overrides_dir = "/path/to/overrides"

# Inline extractor overrides
# [overrides."example.com"]
# whitelist = [".article-body"]
# blacklist = [".newsletter-signup"]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse override file at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid selector {selector:?} for {host}: {reason}")]
    Selector {
        host: String,
        selector: String,
        reason: String,
    },
}
