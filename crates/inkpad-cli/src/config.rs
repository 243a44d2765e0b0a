//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use inkpad_core::util::normalize_text_option;
use inkpad_core::EngineConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Database location used when neither `--db-path` nor `INKPAD_DB_PATH` is set
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("inkpad").join(CONFIG_FILE_NAME))
}

impl CliConfig {
    /// Load from the platform config directory; defaults when absent.
    pub fn load() -> Result<Self, String> {
        default_config_path().map_or_else(
            || Ok(Self::default()),
            |path| Self::load_from_path(&path),
        )
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        config.engine = config
            .engine
            .validated()
            .map_err(|error| format!("Invalid engine settings in {}: {}", path.display(), error))?;
        Ok(config)
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.db_path.as_deref().map(PathBuf::from)
    }

    fn normalize(&mut self) {
        self.db_path = normalize_text_option(self.db_path.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.engine.snapshot_quiet_ms, 3_000);
    }

    #[test]
    fn load_normalizes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "db_path": "  /tmp/notes.db  ",
                "engine": { "max_versions": 5, "share_origin": "https://notes.example.com/" }
            }"#,
        )
        .unwrap();

        let config = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(config.db_path(), Some(PathBuf::from("/tmp/notes.db")));
        assert_eq!(config.engine.max_versions, 5);
        assert_eq!(config.engine.share_origin, "https://notes.example.com");
    }

    #[test]
    fn blank_db_path_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"db_path": "   "}"#).unwrap();

        assert_eq!(CliConfig::load_from_path(&path).unwrap().db_path(), None);
    }

    #[test]
    fn invalid_engine_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"engine": {"max_versions": 0}}"#).unwrap();

        let error = CliConfig::load_from_path(&path).unwrap_err();
        assert!(error.contains("Invalid engine settings"));
    }
}
