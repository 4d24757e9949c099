use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only.
///
/// Used when no config file is present, e.g. in containers that only set
/// `RADARR_URL` and `RADARR_API_KEY`.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(legacy_env())
        .merge(Env::prefixed("REELGATE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Environment names understood for compatibility with existing Radarr
/// deployments. `REELGATE_*` variables take precedence.
fn legacy_env() -> Env {
    Env::raw()
        .only(&[
            "RADARR_URL",
            "RADARR_API_KEY",
            "RADARR_MCP_HOST",
            "RADARR_MCP_PORT",
        ])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "radarr_url" => "upstream.url".into(),
            "radarr_api_key" => "upstream.api_key".into(),
            "radarr_mcp_host" => "server.host".into(),
            "radarr_mcp_port" => "server.port".into(),
            other => other.to_string().into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[upstream]
url = "http://localhost:7878"
api_key = "abc"

[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_missing_upstream() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
url = "http://radarr:7878"
api_key = "abc"
max_retries = 4
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.upstream.url, "http://radarr:7878");
        assert_eq!(config.upstream.max_retries, 4);
    }
}
