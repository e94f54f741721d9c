//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search page navigation settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Single-image download settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Download worker pool settings
    #[serde(default)]
    pub pool: PoolConfig,
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

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.search.endpoint).is_err() {
            return Err(AppError::validation(format!(
                "search.endpoint is not a valid URL: {}",
                self.search.endpoint
            )));
        }
        if self.search.max_images_per_page == 0 {
            return Err(AppError::validation(
                "search.max_images_per_page must be > 0",
            ));
        }
        if self.search.request_timeout_secs == 0 {
            return Err(AppError::validation(
                "search.request_timeout_secs must be > 0",
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_filename_length == 0 {
            return Err(AppError::validation(
                "fetch.max_filename_length must be > 0",
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        Ok(())
    }
}

/// Search session and pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Image search endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Pause between page requests in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Upper bound of result items the engine puts on one page
    #[serde(default = "defaults::max_images_per_page")]
    pub max_images_per_page: usize,

    /// Timeout for a search page request in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,

    /// Overrides the browser profile's User-Agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SearchConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            page_delay_ms: defaults::page_delay(),
            max_images_per_page: defaults::max_images_per_page(),
            request_timeout_secs: defaults::request_timeout(),
            user_agent: None,
        }
    }
}

/// Settings for downloading one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "defaults::fetch_timeout")]
    pub timeout_secs: u64,

    /// Filenames derived from URLs are cut to this many characters
    #[serde(default = "defaults::max_filename_length")]
    pub max_filename_length: usize,

    /// User-Agent header for image requests
    #[serde(default = "defaults::fetch_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::fetch_timeout(),
            max_filename_length: defaults::max_filename_length(),
            user_agent: defaults::fetch_user_agent(),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// How long shutdown waits for outstanding downloads
    #[serde(default = "defaults::drain_timeout")]
    pub drain_timeout_secs: u64,
}

impl PoolConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: defaults::drain_timeout(),
        }
    }
}

mod defaults {
    pub fn endpoint() -> String {
        "https://yandex.ru/images/search".into()
    }
    pub fn page_delay() -> u64 {
        500
    }
    pub fn max_images_per_page() -> usize {
        30
    }
    pub fn request_timeout() -> u64 {
        30
    }

    pub fn fetch_timeout() -> u64 {
        10
    }
    pub fn max_filename_length() -> usize {
        50
    }
    pub fn fetch_user_agent() -> String {
        "Mozilla/5.0 (compatible; imgharvest/0.1)".into()
    }

    pub fn drain_timeout() -> u64 {
        5
    }
}
