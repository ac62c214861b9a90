use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub sparql: SparqlConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Process-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Graph store connection
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Unset means requests never time out.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: None,
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of entries whose signature carries a volatile marker.
    #[serde(default = "default_volatile_ttl_secs")]
    pub volatile_ttl_secs: u64,
    #[serde(default = "default_volatile_markers")]
    pub volatile_markers: Vec<String>,
    /// Unset means the cache is unbounded.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            volatile_ttl_secs: default_volatile_ttl_secs(),
            volatile_markers: default_volatile_markers(),
            max_entries: None,
        }
    }
}

/// Filter table configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    #[serde(default = "default_filter_depth")]
    pub default_depth: usize,
    /// Upper bound on requested `levels` and stored filter depths.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Unset means the table is only reloaded on explicit request.
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            default_depth: default_filter_depth(),
            max_levels: default_max_levels(),
            refresh_interval_secs: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> String {
    "http://database:8890/sparql".to_string()
}

fn default_volatile_ttl_secs() -> u64 {
    // one hour, i.e. 1/24 of a day
    3600
}

fn default_volatile_markers() -> Vec<String> {
    vec!["filter-status".to_string()]
}

fn default_filter_depth() -> usize {
    crate::filter::DEFAULT_FILTER_DEPTH
}

fn default_max_levels() -> usize {
    crate::filter::DEFAULT_MAX_LEVELS
}

fn default_http_port() -> u16 {
    80
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path named in HIERARCHY_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (defaults are used when absent)
    ///
    /// `MU_SPARQL_ENDPOINT`, `HIER_CACHE_TIME` (days) and `PORT` override the file.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let mut config = match std::env::var("HIERARCHY_CONFIG") {
            Ok(path) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_toml_str(&text)?
            }
            Err(_) => {
                let path = PathBuf::from("config.toml");
                if path.exists() {
                    let text = std::fs::read_to_string(&path).with_context(|| {
                        format!("Failed to read config file: {}", path.display())
                    })?;
                    Self::from_toml_str(&text)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config.toml")
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(endpoint) = std::env::var("MU_SPARQL_ENDPOINT") {
            self.sparql.endpoint = endpoint;
        }

        if let Ok(days) = std::env::var("HIER_CACHE_TIME") {
            let days: f64 = days
                .trim()
                .parse()
                .with_context(|| format!("HIER_CACHE_TIME is not a number: {}", days))?;
            self.cache.volatile_ttl_secs = (days * 86_400.0).round().max(0.0) as u64;
        }

        if let Ok(port) = std::env::var("PORT") {
            self.http_server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.sparql.endpoint).with_context(|| {
            format!("sparql.endpoint is not a valid URL: {}", self.sparql.endpoint)
        })?;

        if self.cache.volatile_ttl_secs == 0 {
            anyhow::bail!("cache.volatile_ttl_secs must be greater than 0");
        }

        if self.filters.default_depth == 0 {
            anyhow::bail!("filters.default_depth must be at least 1");
        }

        if self.filters.default_depth > self.filters.max_levels {
            anyhow::bail!("filters.default_depth must not exceed filters.max_levels");
        }

        if self.cache.max_entries == Some(0) {
            anyhow::bail!("cache.max_entries must be greater than 0 when set");
        }

        Ok(())
    }
}
