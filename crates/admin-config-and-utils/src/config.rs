//! Configuration management for the admin tools.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default Supabase URL (local `supabase start` unless SUPABASE_URL is set at compile time).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:54321",
};

/// Default Supabase publishable key (can be overridden at compile time via SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Rows per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    /// User access token. Requests fall back to the publishable key when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Rows per list page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_publishable_key: DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string(),
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be at least 1".to_string()));
        }
        self.supabase_url()?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Override fields from `CARRIER_ADMIN_*` variables resolved by `lookup`.
    ///
    /// Empty values are ignored; an unparsable page size keeps the current one.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(log_level) = var("CARRIER_ADMIN_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(url) = var("CARRIER_ADMIN_SUPABASE_URL") {
            self.supabase_url = url;
        }
        if let Some(key) = var("CARRIER_ADMIN_SUPABASE_KEY") {
            self.supabase_publishable_key = key;
        }
        if let Some(token) = var("CARRIER_ADMIN_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(raw) = var("CARRIER_ADMIN_PAGE_SIZE") {
            match raw.parse::<u32>() {
                Ok(size) => self.page_size = size,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid CARRIER_ADMIN_PAGE_SIZE"),
            }
        }
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    /// Token sent as the bearer credential.
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_deref()
            .unwrap_or(&self.supabase_publishable_key)
    }
}
