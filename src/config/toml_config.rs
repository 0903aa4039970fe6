use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape of `deck-gateway.toml`. Every section is optional; command line
/// flags win over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub firebase: FirebaseSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub gateway_listen: Option<String>,
    pub service_listen: Option<String>,
    pub app_data_directory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirebaseSection {
    pub project_id: Option<String>,
    pub jwks_url: Option<String>,
    pub key_ttl_seconds: Option<u64>,
    pub refetch_interval_seconds: Option<u64>,
    pub jwks_timeout_seconds: Option<u64>,
    pub free_model: Option<String>,
    pub excluded_paths: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GatewayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse after replacing `${VAR}` references with environment values.
    /// Unset variables are left as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| GatewayError::InvalidConfigValueError {
            field: "toml".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| GatewayError::config(format!("env pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
gateway_listen = "0.0.0.0:3000"
service_listen = "127.0.0.1:8000"
app_data_directory = "/var/lib/deck"

[upstream]
base_url = "http://backend:8000"
timeout_seconds = 10

[firebase]
project_id = "appscms-dev"
key_ttl_seconds = 600
free_model = "gemini-2.0-flash"
excluded_paths = ["/health", "/api/v1/user-config"]

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.gateway_listen.as_deref(), Some("0.0.0.0:3000"));
        assert_eq!(config.upstream.timeout_seconds, Some(10));
        assert_eq!(config.firebase.project_id.as_deref(), Some("appscms-dev"));
        assert_eq!(config.firebase.excluded_paths.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.logging.json, Some(true));
        assert_eq!(config.logging.verbose, None);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.upstream.base_url.is_none());
        assert!(config.firebase.project_id.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DECK_GATEWAY_TEST_PROJECT", "substituted-project");

        let toml_content = r#"
[firebase]
project_id = "${DECK_GATEWAY_TEST_PROJECT}"
jwks_url = "${DECK_GATEWAY_TEST_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.firebase.project_id.as_deref(), Some("substituted-project"));
        assert_eq!(
            config.firebase.jwks_url.as_deref(),
            Some("${DECK_GATEWAY_TEST_UNSET_VAR}")
        );

        std::env::remove_var("DECK_GATEWAY_TEST_PROJECT");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(TomlConfig::from_toml_str("[upstream\nbase_url = 1").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[upstream]\nbase_url = \"http://127.0.0.1:9000\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.upstream.base_url.as_deref(), Some("http://127.0.0.1:9000"));
    }
}
