//! # Configuration
//!
//! Settings for reaching a ScienceSource Wikibase instance.
//!
//! Read from a TOML file (all keys optional), then overridden by the
//! environment:
//! - `SCIENCESOURCE_URL` - base URL of the wiki
//! - `SCIENCESOURCE_TOKEN` - OAuth 2 access token sent as a Bearer token
//!
//! ```toml
//! url = "https://sciencesource.wmflabs.org"
//! api_path = "/w/api.php"
//! language = "en"
//! timeout_secs = 30
//! ```

use sciencesource_core::SyncError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default ScienceSource wiki.
pub const DEFAULT_URL: &str = "https://sciencesource.wmflabs.org";

/// Environment variable overriding `url`.
pub const ENV_URL: &str = "SCIENCESOURCE_URL";

/// Environment variable overriding `token`.
pub const ENV_TOKEN: &str = "SCIENCESOURCE_TOKEN";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the wiki, without trailing slash.
    pub url: String,
    /// Path of the MediaWiki action API below `url`.
    pub api_path: String,
    /// OAuth 2 access token.
    pub token: Option<String>,
    /// Language used to match labels.
    pub language: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_path: "/w/api.php".to_string(),
            token: None,
            language: "en".to_string(),
            user_agent: format!("sciencesource/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, SyncError> {
        toml::from_str(text).map_err(|e| SyncError::Serialization(format!("Invalid config: {}", e)))
    }

    /// Load configuration from `path` (or defaults when `None`), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        let config = match path {
            Some(path) => {
                let metadata = std::fs::metadata(path).map_err(|e| {
                    SyncError::Io(format!("Cannot read config {}: {}", path.display(), e))
                })?;
                if metadata.len() > MAX_CONFIG_FILE_SIZE {
                    return Err(SyncError::Serialization(format!(
                        "Config file {} exceeds {} bytes",
                        path.display(),
                        MAX_CONFIG_FILE_SIZE
                    )));
                }
                let text = std::fs::read_to_string(path).map_err(|e| {
                    SyncError::Io(format!("Read config {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from an environment lookup.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            self.url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Full URL of the action API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.api_path.trim_start_matches('/')
        )
    }
}
