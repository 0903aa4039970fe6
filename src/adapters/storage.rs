use crate::core::{ConfigStore, UserConfig};
use crate::utils::error::{GatewayError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const APP_DATA_ENV: &str = "APP_DATA_DIRECTORY";
pub const DEFAULT_APP_DATA_DIR: &str = "./app_data";
pub const USER_CONFIG_FILE: &str = "user_config.json";

const SUBDIRECTORIES: &[&str] = &["images", "exports", "uploads"];

/// Root of everything the service writes to disk.
#[derive(Debug, Clone)]
pub struct AppDataDir {
    root: PathBuf,
}

impl AppDataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `APP_DATA_DIRECTORY` when set and non-empty, the default otherwise.
    pub fn from_env() -> Self {
        match std::env::var(APP_DATA_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::new(DEFAULT_APP_DATA_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn exports(&self) -> PathBuf {
        self.root.join("exports")
    }

    pub fn uploads(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn user_config_path(&self) -> PathBuf {
        self.root.join(USER_CONFIG_FILE)
    }

    pub async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        for sub in SUBDIRECTORIES {
            tokio::fs::create_dir_all(self.root.join(sub)).await?;
        }
        tracing::debug!(root = %self.root.display(), "App data directory ready");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_app_data(dir: &AppDataDir) -> Self {
        Self::new(dir.user_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<UserConfig> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UserConfig::default()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(UserConfig::default());
        }

        let value: serde_json::Value =
            serde_json::from_slice(&data).map_err(|e| GatewayError::StorageError {
                message: format!("{} is corrupt: {}", self.path.display(), e),
            })?;
        UserConfig::try_from(value)
    }

    async fn save(&self, config: &UserConfig) -> Result<()> {
        let data = serde_json::to_vec_pretty(config)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &data))
            .await
            .map_err(|e| GatewayError::StorageError {
                message: format!("write task for {} failed: {}", self.path.display(), e),
            })?
    }
}

/// Each write gets its own temp file next to the target, so concurrent
/// writers never share one and the rename always installs a whole file.
fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
