//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use drivesight_core::{CacheConfig, PipelineConfig};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8080)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 25)
    pub body_limit_mb: usize,
    /// Maximum image size per upload in MB (default: 20)
    pub max_image_size_mb: usize,
    /// Request timeout in seconds (default: 90)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 5)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 10)
    pub rate_limit_burst: u32,
    /// Result cache TTL in seconds (default: 3600)
    pub cache_ttl_secs: u64,
    /// Optional bound on cached assessments
    pub cache_max_entries: Option<usize>,
    /// Perception adapter timeout in seconds (default: 60)
    pub perception_timeout_secs: u64,
    /// Summarizer timeout in seconds (default: 15)
    pub summary_timeout_secs: u64,
    /// Analyses kept for /history and /stats (default: 1000)
    pub history_capacity: usize,
    /// Use mock adapters instead of Gemini (default: true for tests, false from env)
    pub use_mock_adapters: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 25,
            max_image_size_mb: 20,
            timeout_secs: 90,
            rate_limit_enabled: false,
            rate_limit_per_sec: 5,
            rate_limit_burst: 10,
            cache_ttl_secs: 3600,
            cache_max_entries: None,
            perception_timeout_secs: 60,
            summary_timeout_secs: 15,
            history_capacity: 1000,
            use_mock_adapters: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| h.parse::<Ipv4Addr>().ok())
            .map(|ip| ip.octets())
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let use_mock_adapters = std::env::var("USE_MOCK_ADAPTERS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            max_image_size_mb: env_parse("MAX_IMAGE_SIZE_MB").unwrap_or(defaults.max_image_size_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC").unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl_secs),
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES"),
            perception_timeout_secs: env_parse("PERCEPTION_TIMEOUT_SECS")
                .unwrap_or(defaults.perception_timeout_secs),
            summary_timeout_secs: env_parse("SUMMARY_TIMEOUT_SECS")
                .unwrap_or(defaults.summary_timeout_secs),
            history_capacity: env_parse("HISTORY_CAPACITY").unwrap_or(defaults.history_capacity),
            use_mock_adapters,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_size_mb * 1024 * 1024
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            perception_timeout: Duration::from_secs(self.perception_timeout_secs),
            summary_timeout: Duration::from_secs(self.summary_timeout_secs),
            max_image_bytes: self.max_image_bytes(),
            cache: CacheConfig {
                ttl: Duration::from_secs(self.cache_ttl_secs),
                max_entries: self.cache_max_entries,
            },
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_image_bytes(), 20 * 1024 * 1024);
        assert!(config.use_mock_adapters);
        assert!(!config.rate_limit_enabled);
    }

    #[test]
    fn test_pipeline_config_mapping() {
        let config = Config {
            cache_ttl_secs: 120,
            cache_max_entries: Some(64),
            perception_timeout_secs: 30,
            summary_timeout_secs: 5,
            max_image_size_mb: 4,
            ..Config::default()
        };
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.cache.ttl, Duration::from_secs(120));
        assert_eq!(pipeline.cache.max_entries, Some(64));
        assert_eq!(pipeline.perception_timeout, Duration::from_secs(30));
        assert_eq!(pipeline.summary_timeout, Duration::from_secs(5));
        assert_eq!(pipeline.max_image_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            host: [0, 0, 0, 0],
            port: 9000,
            ..Config::default()
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
    }
}
