pub mod cache;
pub mod config;
pub mod metrics;
pub mod testing;
pub mod tools;
pub mod upstream;

pub use cache::{CacheKey, ResponseCache};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, CacheConfig, Config,
    ConfigError, SanitizedConfig, ServerConfig, UpstreamConfig,
};
pub use tools::{ErrorKind, ErrorPayload, ToolError, ToolRouter};
pub use upstream::{MovieLibrary, RadarrClient, UpstreamError, UpstreamSession};
