use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::github::DEFAULT_API_BASE_URL;
use crate::pr::{SearchOptions, DEFAULT_LOOKBACK_DAYS, MAX_PER_PAGE};

const CONFIG_FILE: &str = ".pr-digest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-digest.toml.
/// All fields are optional — the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    /// REST API root, for GitHub Enterprise (`https://<host>/api/v3`)
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Lookback window in days
    pub days: i64,
    pub per_page: u8,
    pub max_pages: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            days: DEFAULT_LOOKBACK_DAYS,
            per_page: options.per_page,
            max_pages: options.max_pages,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log token scopes and private repo visibility before searching
    pub probe: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { probe: true }
    }
}

impl Config {
    /// Load configuration from .pr-digest.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var. Blank values count as absent.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn api_base_url(&self) -> &str {
        self.github
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            per_page: self.query.per_page.clamp(1, MAX_PER_PAGE),
            max_pages: self.query.max_pages.max(1),
            probe: self.diagnostics.probe,
        }
    }
}
