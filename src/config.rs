//! Configuration for the console

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::util;

/// Console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Backend base URL (endpoints live under `{api_url}/api`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for the backend (optional)
    pub api_token: Option<String>,

    /// Poll period in seconds (default: 30)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Arm the recurring poll on host selection (default: true)
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,

    /// Window of the history view in hours (default: 24)
    #[serde(default = "default_history_hours")]
    pub history_hours: u32,

    /// HTTP timeout in seconds; must outlast the backend's action timeout (default: 150)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Regenerate the overview advice after every poll (default: false)
    #[serde(default)]
    pub advise_on_refresh: bool,
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_auto_refresh() -> bool {
    true
}

fn default_history_hours() -> u32 {
    24
}

fn default_request_timeout() -> u64 {
    150
}

impl ConsoleConfig {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(|| {
            let default_path = Self::default_path()?;
            default_path.exists().then_some(default_path)
        });

        let Some(path) = config_path else {
            trace!("no config file found, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
            .inspect(|config| trace!("loaded config: {config:?}"))
    }

    /// `~/.config/hostwatch/console.toml`
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".config/hostwatch/console.toml"))
    }

    /// Apply `HOSTWATCH_*` overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `HOSTWATCH_*` overrides read through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(util::API_URL).filter(|url| !url.is_empty()) {
            self.api_url = url;
        }

        if let Some(token) = lookup(util::API_TOKEN) {
            self.api_token = Some(token).filter(|token| !token.is_empty());
        }

        if let Some(raw) = lookup(util::REFRESH_INTERVAL) {
            match raw.parse() {
                Ok(secs) => self.refresh_interval = secs,
                Err(_) => warn!("ignoring invalid {}: {raw}", util::REFRESH_INTERVAL),
            }
        }

        self
    }

    /// Poll period; never zero
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            refresh_interval: default_refresh_interval(),
            auto_refresh: default_auto_refresh(),
            history_hours: default_history_hours(),
            request_timeout: default_request_timeout(),
            advise_on_refresh: false,
        }
    }
}
