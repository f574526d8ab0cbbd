//! Configuration Storage
//!
//! Config location: ~/.tvnc-session/config.json on macOS/Linux,
//! %APPDATA%\TvncSession\config.json on Windows

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, error, warn};

use super::types::{ConfigFile, CONFIG_VERSION};

/// Configuration storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// Configuration directory
pub fn config_dir() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("TvncSession"));
        }
        dirs::home_dir()
            .map(|home| home.join(".tvnc-session"))
            .ok_or(StorageError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".tvnc-session"))
            .ok_or(StorageError::NoConfigDir)
    }
}

/// Default config file path
pub fn config_file() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("config.json"))
}

/// Configuration storage manager
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Storage at the default path
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            path: config_file()?,
        })
    }

    /// Storage at a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load configuration from disk.
    ///
    /// A missing file yields defaults. An unparsable file is copied aside
    /// and defaults are returned. A file from a newer release is an error.
    pub async fn load(&self) -> Result<ConfigFile, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.path.display());
                return Ok(ConfigFile::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: ConfigFile = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring unreadable config {}: {}", self.path.display(), e);
                self.set_aside().await;
                return Ok(ConfigFile::default());
            }
        };

        if config.version > CONFIG_VERSION {
            return Err(StorageError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn set_aside(&self) {
        let backup_path = self.path.with_extension(format!(
            "json.backup.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));
        match fs::copy(&self.path, &backup_path).await {
            Ok(_) => warn!("Unreadable config kept as {}", backup_path.display()),
            Err(e) => error!("Failed to back up {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_nonexistent() {
        let temp = tempdir().unwrap();
        let storage = ConfigStorage::with_path(temp.path().join("config.json"));

        let config = storage.load().await.unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.session_manager.server_dir.is_none());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "session_manager": {"server_dir": "/opt/TurboVNC-3"}, "ssh": {"username": "alice"}}"#,
        )
        .unwrap();
        let storage = ConfigStorage::with_path(path);

        let loaded = storage.load().await.unwrap();
        assert_eq!(
            loaded.session_manager.server_dir.as_deref(),
            Some("/opt/TurboVNC-3")
        );
        assert!(loaded.session_manager.auto_otp);
        assert_eq!(loaded.session_manager.command_timeout_secs, 30);
        assert_eq!(loaded.ssh.username.as_deref(), Some("alice"));
        assert_eq!(loaded.ssh.port, 22);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_backed_up() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = ConfigStorage::with_path(path);

        let config = storage.load().await.unwrap();
        assert!(config.session_manager.auto_otp);

        let backups = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("backup"))
            .count();
        assert_eq!(backups, 1);
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"version": 99}"#).unwrap();
        let storage = ConfigStorage::with_path(path);

        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, StorageError::VersionTooNew { found: 99, .. }));
    }
}
