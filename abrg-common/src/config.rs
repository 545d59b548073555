//! Configuration loading and data directory resolution

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the geocoder data directory
pub const DATA_DIR_ENV: &str = "ABRG_DATA_DIR";

/// Geocoder configuration loaded from a TOML file.
///
/// Every field is optional in the file; missing fields fall back to
/// compiled defaults so a missing or partial config never aborts startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Directory holding the lookup tables and per-municipality datasets
    pub data_dir: Option<PathBuf>,

    /// Log filter passed to the tracing subscriber (e.g. "abrg_geocoder=debug")
    pub log_level: Option<String>,

    /// Default search target when a request does not specify one
    /// ("all", "residential" or "parcel")
    pub default_target: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file. A missing file yields the defaults with a
    /// warning rather than an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

/// Resolve the data directory following the priority order:
/// 1. Explicit argument (highest priority)
/// 2. `ABRG_DATA_DIR` environment variable
/// 3. TOML config file value
/// 4. `./abrg-data` (fallback)
pub fn resolve_data_dir(explicit: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: explicit argument
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: config file
    if let Some(path) = &config.data_dir {
        return path.clone();
    }

    // Priority 4: compiled default
    PathBuf::from("abrg-data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_argument_wins() {
        let config = TomlConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let dir = resolve_data_dir(Some(Path::new("/explicit")), &config);
        assert_eq!(dir, PathBuf::from("/explicit"));
    }

    #[test]
    fn config_file_used_when_no_override() {
        let config = TomlConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        // Guard against an ambient env var leaking into the test
        if std::env::var(DATA_DIR_ENV).is_err() {
            assert_eq!(resolve_data_dir(None, &config), PathBuf::from("/from/config"));
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = TomlConfig::load(Path::new("/nonexistent/abrg.toml")).unwrap();
        assert!(loaded.data_dir.is_none());
        assert!(loaded.log_level.is_none());
    }

    #[test]
    fn parses_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abrg.toml");
        std::fs::write(&path, "log_level = \"abrg_geocoder=debug\"\n").unwrap();
        let loaded = TomlConfig::load(&path).unwrap();
        assert_eq!(loaded.log_level.as_deref(), Some("abrg_geocoder=debug"));
        assert!(loaded.data_dir.is_none());
    }
}
