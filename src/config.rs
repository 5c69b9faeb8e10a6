// Runtime configuration.
// Resolves the cache location and star lookup settings from command-line flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::catalog::Category;
use crate::error::{HubError, Result};
use crate::stars::{DEFAULT_LOOKUP_TIMEOUT, DEFAULT_TTL};

/// Get the base cache directory (~/.cache/benefits-hub on Linux).
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "benefits-hub").map(|dirs| dirs.cache_dir().to_path_buf())
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Token for authenticated GitHub requests.
    pub github_token: Option<String>,
    /// GitHub API root; `None` uses api.github.com.
    pub api_url: Option<String>,
    /// Where the stars cache and log file live. `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    pub ttl: Duration,
    pub lookup_timeout: Duration,
    /// Alternative catalog file instead of the bundled one.
    pub catalog_path: Option<PathBuf>,
    /// Initial category filter; `None` shows all.
    pub category: Option<Category>,
    /// Initial search query.
    pub query: String,
    /// Print the ranked list instead of starting the TUI.
    pub plain: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            api_url: None,
            cache_dir: default_cache_dir(),
            ttl: DEFAULT_TTL,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            catalog_path: None,
            category: None,
            query: String::new(),
            plain: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a category filter argument. "All" (or empty) means no filter.
    pub fn parse_category(raw: &str) -> Result<Option<Category>> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        Category::from_title(raw)
            .map(Some)
            .ok_or_else(|| HubError::Other(format!("unknown category: {}", raw)))
    }

    /// Blank tokens are treated as absent.
    pub fn normalize_token(token: Option<String>) -> Option<String> {
        token.filter(|token| !token.trim().is_empty())
    }

    /// Path of the log file used while the TUI owns the terminal.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join("benefits-hub.log"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(HubError::Other("TTL must be greater than zero".to_string()));
        }
        if self.lookup_timeout.is_zero() {
            return Err(HubError::Other(
                "lookup timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
