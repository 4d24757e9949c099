use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    4200
}

/// Connection settings for the upstream Radarr instance.
#[derive(Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Radarr base URL (e.g., "http://localhost:7878")
    pub url: String,
    /// Radarr API key, sent as `X-Api-Key` on every request
    pub api_key: String,
    /// Per-request timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Total attempts for idempotent reads (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay; doubles on every further attempt (default: 500)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff delay (default: 5000)
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Maximum concurrent in-flight upstream requests (default: 10)
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl UpstreamConfig {
    /// Config pointing at `url` with every tunable at its default.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_connections: default_max_connections(),
        }
    }
}

// Hand-written so the API key never ends up in a log line.
impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("api_key", &"****")
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    5_000
}

fn default_max_connections() -> usize {
    10
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds (default: 600)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    600
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub upstream: SanitizedUpstreamConfig,
    pub cache: CacheConfig,
}

/// Sanitized upstream config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpstreamConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub max_connections: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            upstream: SanitizedUpstreamConfig {
                url: config.upstream.url.clone(),
                api_key_configured: !config.upstream.api_key.is_empty(),
                timeout_ms: config.upstream.timeout_ms,
                max_retries: config.upstream.max_retries,
                max_connections: config.upstream.max_connections,
            },
            cache: config.cache.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[upstream]
url = "http://localhost:7878"
api_key = "abc123"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upstream.url, "http://localhost:7878");
        assert_eq!(config.server.port, 4200);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.upstream.timeout_ms, 30_000);
        assert_eq!(config.upstream.max_retries, 3);
        assert_eq!(config.upstream.max_connections, 10);
        assert_eq!(config.cache.ttl_secs, 600);
    }

    #[test]
    fn test_deserialize_missing_upstream_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[upstream]
url = "https://radarr.example.com"
api_key = "abc123"
timeout_ms = 5000
max_retries = 5
retry_base_delay_ms = 100
max_connections = 2

[cache]
ttl_secs = 60
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.upstream.timeout_ms, 5000);
        assert_eq!(config.upstream.max_retries, 5);
        assert_eq!(config.upstream.retry_base_delay_ms, 100);
        assert_eq!(config.upstream.retry_max_delay_ms, 5_000);
        assert_eq!(config.upstream.max_connections, 2);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let upstream = UpstreamConfig::new("http://localhost:7878", "super-secret-key");
        let rendered = format!("{:?}", upstream);
        assert!(!rendered.contains("super-secret-key"));
        assert!(rendered.contains("****"));
    }

    #[test]
    fn test_sanitized_config_hides_key() {
        let config = Config {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::new("http://localhost:7878", "super-secret-key"),
            cache: CacheConfig::default(),
        };

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.upstream.api_key_configured);
        assert_eq!(sanitized.upstream.url, "http://localhost:7878");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret-key"));
    }

    #[test]
    fn test_sanitized_config_reports_missing_key() {
        let config = Config {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::new("http://localhost:7878", ""),
            cache: CacheConfig::default(),
        };
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.upstream.api_key_configured);
    }
}
