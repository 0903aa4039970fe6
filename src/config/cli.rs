use super::{GatewaySettings, ServiceSettings, TomlConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

fn load_file(path: Option<&str>) -> Result<TomlConfig> {
    match path {
        Some(path) => TomlConfig::from_file(Path::new(path)),
        None => Ok(TomlConfig::default()),
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "deck-gateway")]
#[command(about = "Browser-facing proxy for the user-config service")]
pub struct GatewayArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub listen: Option<String>,

    /// Base URL of the user-config service
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl GatewayArgs {
    pub fn load(&self) -> Result<(GatewaySettings, TomlConfig)> {
        let file = load_file(self.config.as_deref())?;
        let mut settings = GatewaySettings::from_toml(&file);

        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        if let Some(url) = &self.upstream_url {
            settings.upstream_url = url.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        Ok((settings, file))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "user_config_service")]
#[command(about = "User-config service with Firebase authentication")]
pub struct ServiceArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub listen: Option<String>,

    /// Firebase project id tokens must be issued for
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Directory for persisted data (falls back to APP_DATA_DIRECTORY)
    #[arg(long)]
    pub app_data_directory: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ServiceArgs {
    pub fn load(&self) -> Result<(ServiceSettings, TomlConfig)> {
        let file = load_file(self.config.as_deref())?;
        let mut settings = ServiceSettings::from_toml(&file);

        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        if let Some(project_id) = &self.project_id {
            settings.project_id = Some(project_id.clone());
        }
        if let Some(dir) = &self.app_data_directory {
            settings.app_data_directory = Some(dir.clone());
        }
        Ok((settings, file))
    }
}
