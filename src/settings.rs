use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::application::services::DEFAULT_SEMESTER;

/// Default filename used to persist configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

/// Data store adapters compiled into the binary.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// Embedded sled database under `<data_dir>/store`.
    #[default]
    Sled,
    /// Process-local store; nothing survives a restart.
    Memory,
}

impl StoreBackend {
    pub fn id(&self) -> &'static str {
        match self {
            StoreBackend::Sled => "sled",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Complete persisted configuration payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_semester")]
    pub default_semester: String,
    #[serde(default)]
    pub store: StoreBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_semester: default_semester(),
            store: StoreBackend::default(),
        }
    }
}

/// Thread-safe manager responsible for loading and persisting `AppConfig`.
pub struct ConfigManager {
    path: PathBuf,
    state: RwLock<AppConfig>,
}

impl ConfigManager {
    /// Create a manager rooted at `data_dir`. The JSON file will be located at
    /// `<data_dir>/config.json`; a missing or unreadable file yields defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let config = if path.exists() {
            fs::read(&path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<AppConfig>(&bytes).ok())
                .unwrap_or_default()
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(config),
        })
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> AppConfig {
        self.state.read().clone()
    }

    /// Update the fallback semester and persist to disk.
    pub fn set_default_semester(&self, semester: impl Into<String>) -> std::io::Result<AppConfig> {
        let semester = semester.into();
        if semester.trim().is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "default semester cannot be empty",
            ));
        }

        let mut guard = self.state.write();
        guard.default_semester = semester.trim().to_string();
        self.persist_locked(&guard)?;
        Ok(guard.clone())
    }

    /// Ensure the backing directory exists and write the JSON payload.
    fn persist_locked(&self, config: &AppConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, payload)
    }
}

fn default_semester() -> String {
    DEFAULT_SEMESTER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load(dir.path()).unwrap();

        assert_eq!(manager.current(), AppConfig::default());
        assert_eq!(manager.current().default_semester, "20153");
        assert_eq!(manager.current().store, StoreBackend::Sled);
    }

    #[test]
    fn test_set_default_semester_persists() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load(dir.path()).unwrap();

        manager.set_default_semester(" 20161 ").unwrap();

        let reloaded = ConfigManager::load(dir.path()).unwrap();
        assert_eq!(reloaded.current().default_semester, "20161");
        assert!(manager.set_default_semester("").is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{ "store": "memory" }"#).unwrap();

        let config = ConfigManager::load(dir.path()).unwrap().current();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.default_semester, DEFAULT_SEMESTER);
    }

    #[test]
    fn test_garbage_file_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), b"not json").unwrap();

        let manager = ConfigManager::load(dir.path()).unwrap();

        assert_eq!(manager.current(), AppConfig::default());
    }
}
