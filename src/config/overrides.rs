//! Per-host include/exclude selector rules for the content extractor.
//!
//! Rules live either inline in `config.toml`:
//!
//! ```toml
//! [overrides."nytimes.com"]
//! whitelist = [".story-body"]
//! blacklist = [".story-ad", "figure.video"]
//! ```
//!
//! or as `<normalized-host>.json` files in `extractor.overrides_dir`. Every
//! selector is compiled at load time so a typo surfaces immediately.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::Deserialize;

use super::ConfigError;
use crate::urls::normalize_host;

/// Raw selector lists as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverrideSpec {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

/// Compiled selectors for one host.
#[derive(Debug, Clone, Default)]
pub struct OverrideRules {
    pub whitelist: Vec<Selector>,
    pub blacklist: Vec<Selector>,
}

impl OverrideRules {
    pub fn compile(host: &str, spec: &OverrideSpec) -> Result<Self, ConfigError> {
        let compile_all = |selectors: &[String]| {
            selectors
                .iter()
                .map(|s| {
                    Selector::parse(s).map_err(|e| ConfigError::Selector {
                        host: host.to_string(),
                        selector: s.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            whitelist: compile_all(&spec.whitelist)?,
            blacklist: compile_all(&spec.blacklist)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}

/// Override rules keyed by normalized host.
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    rules: HashMap<String, OverrideRules>,
    empty: OverrideRules,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the store from inline config tables.
    pub fn from_specs(specs: &HashMap<String, OverrideSpec>) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        for (host, spec) in specs {
            store.insert(host, spec)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, host: &str, spec: &OverrideSpec) -> Result<(), ConfigError> {
        let key = normalize_host(host);
        let rules = OverrideRules::compile(&key, spec)?;
        self.rules.insert(key, rules);
        Ok(())
    }

    /// Loads every `*.json` file in `dir`; the file stem is the host key.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ConfigError> {
        let entries = fs::read_dir(dir).map_err(|e| ConfigError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| ConfigError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })?
                .path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(host) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let spec: OverrideSpec =
                serde_json::from_str(&content).map_err(|e| ConfigError::Json {
                    path: path.clone(),
                    source: e,
                })?;

            self.insert(host, &spec)?;
            loaded += 1;
        }

        tracing::debug!("Loaded {} override files from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Rules for the host of `url`. Hosts without rules get an empty set.
    pub fn rules_for(&self, url: &str) -> &OverrideRules {
        self.rules.get(&normalize_host(url)).unwrap_or(&self.empty)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
