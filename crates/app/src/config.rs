use std::path::{Path, PathBuf};

use folio_core::{ExtractionSettings, SettingsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parent of per-operation output folders.
    pub output_root: PathBuf,
    pub audit_log: PathBuf,
    pub extraction: ExtractionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("outputs"),
            audit_log: PathBuf::from("logs/usage.csv"),
            extraction: ExtractionSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(toml_content)?;
        config.extraction.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise `folio.toml` under `cwd` is
    /// used when present, and defaults when not.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        Self::from_toml(&content)
    }

    pub fn output_dir_for(&self, operation: &str) -> PathBuf {
        self.output_root.join(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.output_dir_for("card-statement"), PathBuf::from("outputs/card-statement"));
    }

    #[test]
    fn picks_up_folio_toml_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "output_root = \"out\"\n\n[extraction]\nline_bin_height = 3.0\n",
        )
        .unwrap();
        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.output_root, PathBuf::from("out"));
        assert_eq!(config.audit_log, PathBuf::from("logs/usage.csv"));
        assert_eq!(config.extraction.line_bin_height, 3.0);
        assert_eq!(config.extraction.dedup_decimals, 1);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("missing.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn invalid_extraction_values_are_rejected() {
        let err = AppConfig::from_toml("[extraction]\nline_bin_height = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
        assert!(matches!(AppConfig::from_toml("output_root = 5"), Err(ConfigError::Toml(_))));
    }
}
