//! Importer configuration, read from `legacy-import.toml`.
//!
//! Every key is optional. A missing file means defaults; a malformed one is
//! an error so a typo never silently points the importer at the wrong store.

use crate::core::error::ImportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "legacy-import.toml";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub legacy_db: PathBuf,
    pub destination_db: PathBuf,
    /// Bundle used when the source bundle does not exist at the destination.
    pub default_bundle: String,
    /// Account that owns every imported node. No user mapping is done.
    pub owner_id: i64,
    pub text_format: String,
    /// JSONL outcome log; `None` disables it.
    pub audit_log: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            legacy_db: PathBuf::from("legacy.sqlite"),
            destination_db: PathBuf::from("site.sqlite"),
            default_bundle: "page".to_string(),
            owner_id: 1,
            text_format: "basic_html".to_string(),
            audit_log: None,
        }
    }
}

impl ImportConfig {
    /// Resolve relative store paths against `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.legacy_db.is_relative() {
            self.legacy_db = base.join(&self.legacy_db);
        }
        if self.destination_db.is_relative() {
            self.destination_db = base.join(&self.destination_db);
        }
        if let Some(log) = self.audit_log.take() {
            self.audit_log = Some(if log.is_relative() { base.join(log) } else { log });
        }
        self
    }
}

/// Load `legacy-import.toml` from `dir`, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<ImportConfig, ImportError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(ImportConfig::default().rooted_at(dir));
    }
    let content = fs::read_to_string(&config_path).map_err(ImportError::IoError)?;
    let config: ImportConfig = toml::from_str(&content)
        .map_err(|e| ImportError::ConfigError(format!("{}: {}", config_path.display(), e)))?;
    if config.default_bundle.trim().is_empty() {
        return Err(ImportError::ConfigError(
            "default_bundle must not be empty".into(),
        ));
    }
    Ok(config.rooted_at(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.default_bundle, "page");
        assert_eq!(config.owner_id, 1);
        assert_eq!(config.legacy_db, tmp.path().join("legacy.sqlite"));
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "legacy_db = \"/srv/old.sqlite\"\naudit_log = \"events.jsonl\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.legacy_db, PathBuf::from("/srv/old.sqlite"));
        assert_eq!(config.destination_db, tmp.path().join("site.sqlite"));
        assert_eq!(config.audit_log, Some(tmp.path().join("events.jsonl")));
        assert_eq!(config.text_format, "basic_html");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "legacy = \"x\"\n").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ImportError::ConfigError(_)));
    }
}
