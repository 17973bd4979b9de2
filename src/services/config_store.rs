// Configuration Storage Service
// Persists humanize settings and the last input text, with versioned backups

use crate::models::HumanizeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";
const LAST_TEXT_FILE: &str = "last_text.txt";
const BACKUP_DIR: &str = "backups";
const BACKUPS_KEPT: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigStoreError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub humanize: HumanizeConfig,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            humanize: HumanizeConfig::default(),
        }
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join(CONFIG_FILE);
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("redacta"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigStoreError> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<StoredSettings, ConfigStoreError> {
        if !self.config_file.exists() {
            return Ok(StoredSettings::default());
        }
        let content = fs::read_to_string(&self.config_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_humanize(&self) -> Result<HumanizeConfig, ConfigStoreError> {
        Ok(self.load()?.humanize)
    }

    /// Save settings, backing up the previous file first
    pub fn save(&self, settings: &StoredSettings) -> Result<(), ConfigStoreError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_file, content)?;
        info!("[CONFIG] settings saved to {}", self.config_file.display());
        Ok(())
    }

    pub fn save_humanize(&self, config: &HumanizeConfig) -> Result<(), ConfigStoreError> {
        let mut settings = self.load().unwrap_or_else(|e| {
            warn!("[CONFIG] unreadable settings replaced: {}", e);
            StoredSettings::default()
        });
        settings.version = default_version();
        settings.humanize = config.clone();
        self.save(&settings)
    }

    pub fn save_last_text(&self, text: &str) -> Result<(), ConfigStoreError> {
        self.ensure_dir()?;
        fs::write(self.config_dir.join(LAST_TEXT_FILE), text)?;
        Ok(())
    }

    pub fn load_last_text(&self) -> Result<Option<String>, ConfigStoreError> {
        let path = self.config_dir.join(LAST_TEXT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_dir.join(BACKUP_DIR)
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), ConfigStoreError> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_KEPT)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigStoreError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first; names carry the timestamp, so they break mtime ties.
        entries.sort_by_key(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            (modified, e.file_name())
        });

        for entry in entries.iter().take(entries.len() - keep) {
            if let Err(e) = fs::remove_file(entry.path()) {
                warn!("[CONFIG] failed to remove backup {}: {}", entry.path().display(), e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intensity;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("redacta"));
        let settings = store.load().unwrap();
        assert_eq!(settings.humanize, HumanizeConfig::default());
        assert_eq!(store.load_last_text().unwrap(), None);
    }

    #[test]
    fn test_save_and_reload_settings() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let config = HumanizeConfig {
            intensity: Intensity::Aggressive,
            enable_source_mixing: true,
            ..HumanizeConfig::default()
        };
        store.save_humanize(&config).unwrap();
        assert_eq!(store.load_humanize().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"humanize":{"intensity":"extreme","enableColloquialisms":false}}"#,
        )
        .unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let config = store.load_humanize().unwrap();
        assert_eq!(config.intensity, Intensity::Aggressive);
        assert!(!config.enable_colloquialisms);
        assert!(config.enable_auto_optimize);
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        assert!(matches!(store.load(), Err(ConfigStoreError::Json(_))));
    }

    #[test]
    fn test_backups_are_capped() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        for _ in 0..14 {
            store.save(&StoredSettings::default()).unwrap();
        }
        let count = fs::read_dir(store.backup_dir()).unwrap().count();
        assert!(count >= 1 && count <= BACKUPS_KEPT, "backup count {}", count);
    }

    #[test]
    fn test_last_text_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        store.save_last_text("Texto con ñ y acentos: canción.").unwrap();
        assert_eq!(
            store.load_last_text().unwrap().as_deref(),
            Some("Texto con ñ y acentos: canción.")
        );
    }
}
