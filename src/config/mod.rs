#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::firebase::{DEFAULT_KEY_TTL, DEFAULT_REFETCH_INTERVAL, GOOGLE_JWKS_URL};
use crate::adapters::http::DEFAULT_UPSTREAM_URL;
use crate::core::auth::{AuthPolicy, DEFAULT_EXCLUDED_PATHS, DEFAULT_FREE_MODEL};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    validate_socket_addr, validate_url, Validate,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::{GatewayArgs, ServiceArgs};
pub use toml_config::TomlConfig;

pub const DEFAULT_GATEWAY_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVICE_LISTEN: &str = "127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved settings for the browser-facing gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub listen: String,
    pub upstream_url: String,
    pub timeout_seconds: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_GATEWAY_LISTEN.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewaySettings {
    pub fn from_toml(file: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            listen: file.server.gateway_listen.clone().unwrap_or(defaults.listen),
            upstream_url: file.upstream.base_url.clone().unwrap_or(defaults.upstream_url),
            timeout_seconds: file.upstream.timeout_seconds.unwrap_or(defaults.timeout_seconds),
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        validate_socket_addr("server.gateway_listen", &self.listen)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for GatewaySettings {
    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        validate_url("upstream.base_url", &self.upstream_url)?;
        validate_positive_number("upstream.timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

/// Resolved settings for the user-config service.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub listen: String,
    pub app_data_directory: Option<String>,
    pub project_id: Option<String>,
    pub jwks_url: String,
    pub key_ttl_seconds: u64,
    pub refetch_interval_seconds: u64,
    pub jwks_timeout_seconds: u64,
    pub free_model: String,
    pub excluded_paths: Vec<String>,
}

impl ServiceSettings {
    pub fn from_toml(file: &TomlConfig) -> Self {
        let firebase = &file.firebase;
        Self {
            listen: file
                .server
                .service_listen
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVICE_LISTEN.to_string()),
            app_data_directory: file.server.app_data_directory.clone(),
            project_id: firebase.project_id.clone(),
            jwks_url: firebase
                .jwks_url
                .clone()
                .unwrap_or_else(|| GOOGLE_JWKS_URL.to_string()),
            key_ttl_seconds: firebase
                .key_ttl_seconds
                .unwrap_or(DEFAULT_KEY_TTL.as_secs()),
            refetch_interval_seconds: firebase
                .refetch_interval_seconds
                .unwrap_or(DEFAULT_REFETCH_INTERVAL.as_secs()),
            jwks_timeout_seconds: firebase.jwks_timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            free_model: firebase
                .free_model
                .clone()
                .unwrap_or_else(|| DEFAULT_FREE_MODEL.to_string()),
            excluded_paths: firebase.excluded_paths.clone().unwrap_or_else(|| {
                DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect()
            }),
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        validate_socket_addr("server.service_listen", &self.listen)
    }

    pub fn project_id(&self) -> Result<&str> {
        let project_id = validate_required_field("firebase.project_id", &self.project_id)?;
        validate_non_empty_string("firebase.project_id", project_id)?;
        Ok(project_id.as_str())
    }

    pub fn key_ttl(&self) -> Duration {
        Duration::from_secs(self.key_ttl_seconds)
    }

    pub fn refetch_interval(&self) -> Duration {
        Duration::from_secs(self.refetch_interval_seconds)
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_seconds)
    }

    pub fn app_data_directory(&self) -> Option<PathBuf> {
        self.app_data_directory.as_ref().map(PathBuf::from)
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy::new(self.excluded_paths.clone(), self.free_model.clone())
    }
}

impl Validate for ServiceSettings {
    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.project_id()?;
        validate_url("firebase.jwks_url", &self.jwks_url)?;
        validate_positive_number("firebase.key_ttl_seconds", self.key_ttl_seconds, 1)?;
        validate_positive_number("firebase.jwks_timeout_seconds", self.jwks_timeout_seconds, 1)?;
        validate_non_empty_string("firebase.free_model", &self.free_model)?;
        if let Some(dir) = &self.app_data_directory {
            validate_path("server.app_data_directory", dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults_match_upstream_location() {
        let settings = GatewaySettings::from_toml(&TomlConfig::default());
        assert_eq!(settings.upstream_url, "http://localhost:8000");
        assert_eq!(settings.listen, "127.0.0.1:3000");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_gateway_rejects_bad_upstream() {
        let settings = GatewaySettings {
            upstream_url: "localhost:8000".to_string(),
            ..GatewaySettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_service_requires_project_id() {
        let settings = ServiceSettings::from_toml(&TomlConfig::default());
        assert!(matches!(
            settings.validate(),
            Err(crate::utils::error::GatewayError::MissingConfigError { .. })
        ));

        let settings = ServiceSettings {
            project_id: Some("  ".to_string()),
            ..ServiceSettings::from_toml(&TomlConfig::default())
        };
        assert!(matches!(
            settings.validate(),
            Err(crate::utils::error::GatewayError::InvalidConfigValueError { .. })
        ));

        let file = TomlConfig::from_toml_str("[firebase]\nproject_id = \"appscms-dev\"\n").unwrap();
        let settings = ServiceSettings::from_toml(&file);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.jwks_url, GOOGLE_JWKS_URL);
        assert_eq!(settings.excluded_paths.len(), DEFAULT_EXCLUDED_PATHS.len());
        assert_eq!(settings.auth_policy().free_model(), "gemini-2.0-flash");
        assert_eq!(settings.refetch_interval(), DEFAULT_REFETCH_INTERVAL);
    }

    #[test]
    fn test_jwks_timeout_comes_from_firebase_section() {
        let file = TomlConfig::from_toml_str(
            "[upstream]\ntimeout_seconds = 5\n\n[firebase]\nproject_id = \"appscms-dev\"\njwks_timeout_seconds = 12\n",
        )
        .unwrap();
        let settings = ServiceSettings::from_toml(&file);
        assert_eq!(settings.jwks_timeout(), Duration::from_secs(12));

        let file = TomlConfig::from_toml_str("[upstream]\ntimeout_seconds = 5\n").unwrap();
        let settings = ServiceSettings::from_toml(&file);
        assert_eq!(settings.jwks_timeout_seconds, DEFAULT_TIMEOUT_SECS);
    }
}
