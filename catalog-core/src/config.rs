use std::path::PathBuf;
use std::time::Duration;

use catalog_client::ClientConfig;

/// Catalog configuration - every knob of the cache coordinator
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | CATALOG_API_URL | https://api.escuelajs.co/api/v1 | Storefront API base URL |
/// | CATALOG_REQUEST_TIMEOUT_SECS | 30 | HTTP request timeout |
/// | CATALOG_PAGE_SIZE | 20 | Products per pagination page |
/// | CATALOG_SEARCH_PAGE_SIZE | 1000 | Page size of the full-catalog search fetch |
/// | CATALOG_CATEGORY_LIMIT | 50 | Categories fetched on initialize |
/// | CATALOG_DEBOUNCE_MS | 300 | Intent debounce window |
/// | CATALOG_MAX_FAILURES | 3 | Consecutive failures before intents are rejected |
/// | CATALOG_BACKUP_DIR | dataset | Directory holding categories.json / products.json |
/// | CATALOG_RECOVERY_TIMEOUT_SECS | 60 | Upper bound for one reconciliation run |
///
/// # Example
///
/// ```ignore
/// CATALOG_PAGE_SIZE=12 CATALOG_DEBOUNCE_MS=150 cargo run --example browse
/// ```
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Storefront API base URL
    pub api_url: String,
    /// HTTP request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Pagination page size
    pub page_size: usize,
    /// Page size used to pull the whole catalog for a search
    pub search_page_size: usize,
    /// Category list limit
    pub category_limit: usize,
    /// Intent debounce window (milliseconds)
    pub debounce_ms: u64,
    /// Breaker threshold
    pub max_consecutive_failures: u32,
    /// Backup dataset directory
    pub backup_dir: PathBuf,
    /// Reconciliation timeout (seconds)
    pub recovery_timeout_secs: u64,
}

impl CatalogConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("CATALOG_API_URL").unwrap_or(defaults.api_url),
            request_timeout_secs: env_parse("CATALOG_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            page_size: env_parse("CATALOG_PAGE_SIZE").unwrap_or(defaults.page_size),
            search_page_size: env_parse("CATALOG_SEARCH_PAGE_SIZE")
                .unwrap_or(defaults.search_page_size),
            category_limit: env_parse("CATALOG_CATEGORY_LIMIT").unwrap_or(defaults.category_limit),
            debounce_ms: env_parse("CATALOG_DEBOUNCE_MS").unwrap_or(defaults.debounce_ms),
            max_consecutive_failures: env_parse("CATALOG_MAX_FAILURES")
                .unwrap_or(defaults.max_consecutive_failures),
            backup_dir: std::env::var("CATALOG_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_dir),
            recovery_timeout_secs: env_parse("CATALOG_RECOVERY_TIMEOUT_SECS")
                .unwrap_or(defaults.recovery_timeout_secs),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    /// HTTP client configuration derived from this config
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone()).with_timeout(self.request_timeout_secs)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: catalog_client::config::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            page_size: 20,
            search_page_size: 1000,
            category_limit: 50,
            debounce_ms: 300,
            max_consecutive_failures: 3,
            backup_dir: PathBuf::from("dataset"),
            recovery_timeout_secs: 60,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
