use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Result, WrapErr};

use crate::config::{models::AdapterConfig, validation::AdapterConfigValidator};

/// Prefix for environment overrides, e.g. `AXON_ADAPTER__LISTEN_ADDR`.
pub const ENV_PREFIX: &str = "AXON_ADAPTER";

/// Load and validate configuration from a file.
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<AdapterConfig> {
    let config = load_config_sync(config_path)?;
    AdapterConfigValidator::validate(&config)
        .wrap_err_with(|| format!("Invalid configuration in {config_path}"))?;
    Ok(config)
}

/// Load configuration synchronously, without validation
pub fn load_config_sync(config_path: &str) -> Result<AdapterConfig> {
    let config_path = Path::new(config_path);

    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .wrap_err_with(|| format!("Failed to build config from {}", config_path.display()))?;

    let adapter_config: AdapterConfig = settings.try_deserialize().wrap_err_with(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(adapter_config)
}

/// Load configuration without validation (used for validation command)
pub async fn load_config_unchecked(config_path: &str) -> Result<AdapterConfig> {
    load_config_sync(config_path)
}

/// Default configuration written by `init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# HTTP adapter configuration

# Name matched against a command's `adapters` list
name = "HttpAdapter"

# The address to listen on (port 0 picks an ephemeral port)
listen_addr = "127.0.0.1:8080"

# Response header carrying the application exit code
exit_code_header = "x-exit-code"
request_id_header = "x-request-id"

# Larger request bodies are answered with 413
body_limit_bytes = 1048576

[middleware]
request_id = true
request_timing = true
compression = false

[logging]
level = "info"
json = false

# Routes bound to the request flow; `:name` and `*rest` segments are supported
[[routes]]
url = "/echo/:name"
methods = ["get", "post"]

# [[routes]]
# url = "/files/*path"
# methods = ["all"]
"#;

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::core::HttpMethod;

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
name = "edge"
listen_addr = "127.0.0.1:3000"

[middleware]
compression = true

[[routes]]
url = "/users/:id"
methods = ["get", "delete"]
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.name, "edge");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert!(config.middleware.compression);
        assert!(config.middleware.request_id);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].methods, vec![HttpMethod::Get, HttpMethod::Delete]);
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:3000"
exit_code_header: "x-app-exit"
routes:
  - url: "/health"
    methods: ["all"]
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.exit_code_header, "x-app-exit");
        assert_eq!(config.routes[0].methods, vec![HttpMethod::All]);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "listen_addr": "127.0.0.1:3000",
  "logging": { "level": "debug", "json": true },
  "routes": [ { "url": "/a", "methods": ["post"] } ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.name, "HttpAdapter");
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_but_loads_unchecked() {
        let toml_content = r#"
listen_addr = "not-an-address"

[[routes]]
url = "no-slash"
methods = ["get"]
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();
        let path = temp_file.path().to_str().unwrap();

        assert!(load_config(path).await.is_err());
        let config = load_config_unchecked(path).await.unwrap();
        assert_eq!(config.listen_addr, "not-an-address");
    }

    #[test]
    fn test_default_config_loads_and_validates() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", DEFAULT_CONFIG_TOML).unwrap();

        let config = load_config_sync(temp_file.path().to_str().unwrap()).unwrap();
        assert!(AdapterConfigValidator::validate(&config).is_ok());
        assert_eq!(config, {
            let mut expected = AdapterConfig::default();
            expected.routes.push(crate::config::models::RouteEntry::new(
                "/echo/:name",
                [HttpMethod::Get, HttpMethod::Post],
            ));
            expected
        });
    }
}
