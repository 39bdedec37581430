//! Editor settings
//! Loaded from ~/.config/mdedit/settings.json unless a path is given

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{DomainResult, DEFAULT_HISTORY_CAPACITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Undo steps kept per open table.
    pub history_capacity: usize,

    /// Blank data rows a loaded table is padded to.
    pub min_rows: usize,

    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,

    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_rows: 1000,
            log_filter: "info".to_string(),
            log_file: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mdedit")
            .join("settings.json")
    }

    /// Reads settings from `path`, or the default location when `None`.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> DomainResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> DomainResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mdedit.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(Some(&dir.path().join("none.json"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "min_rows": 50 }"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.min_rows, 50);
        assert_eq!(settings.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(DomainError::Serialization(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            history_capacity: 10,
            log_file: Some(dir.path().join("log.txt")),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(Some(&path)).unwrap(), settings);
    }
}
