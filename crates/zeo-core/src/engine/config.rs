use super::history::DEFAULT_MAX_UNDO;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_GZIP_LEVEL: u32 = 9;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Tunables of an editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of undo entries; the oldest is dropped beyond this.
    pub max_undo: usize,
    /// Compression level used when saving `*.gz` files (`0..=9`) and
    /// `*.bz2` files (clamped to `1..=9`).
    pub gzip_level: u32,
    /// Store the opened file's path as an absolute, symlink-free path.
    pub canonicalize_filename: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
            gzip_level: DEFAULT_GZIP_LEVEL,
            canonicalize_filename: true,
        }
    }
}

/// On-disk form of [`SessionConfig`]; every key is optional.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfigFile {
    pub max_undo: Option<usize>,
    pub gzip_level: Option<u32>,
    pub canonicalize_filename: Option<bool>,
}

impl SessionConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

#[derive(Default)]
pub struct SessionConfigBuilder {
    max_undo: Option<usize>,
    gzip_level: Option<u32>,
    canonicalize_filename: Option<bool>,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the values present in a configuration file.
    pub fn from_file(file: &SessionConfigFile) -> Self {
        Self {
            max_undo: file.max_undo,
            gzip_level: file.gzip_level,
            canonicalize_filename: file.canonicalize_filename,
        }
    }

    pub fn max_undo(mut self, depth: usize) -> Self {
        self.max_undo = Some(depth);
        self
    }
    pub fn gzip_level(mut self, level: u32) -> Self {
        self.gzip_level = Some(level);
        self
    }
    pub fn canonicalize_filename(mut self, enabled: bool) -> Self {
        self.canonicalize_filename = Some(enabled);
        self
    }

    /// Fills unset values with defaults and validates ranges.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        let defaults = SessionConfig::default();
        let max_undo = self.max_undo.unwrap_or(defaults.max_undo);
        if max_undo == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_undo",
                reason: "must be at least 1".to_string(),
            });
        }
        let gzip_level = self.gzip_level.unwrap_or(defaults.gzip_level);
        if gzip_level > 9 {
            return Err(ConfigError::InvalidParameter {
                parameter: "gzip_level",
                reason: format!("{} is outside 0..=9", gzip_level),
            });
        }
        Ok(SessionConfig {
            max_undo,
            gzip_level,
            canonicalize_filename: self
                .canonicalize_filename
                .unwrap_or(defaults.canonicalize_filename),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builder_defaults_match_default_config() {
        assert_eq!(
            SessionConfigBuilder::new().build().unwrap(),
            SessionConfig::default()
        );
    }

    #[test]
    fn builder_rejects_out_of_range_values() {
        assert!(matches!(
            SessionConfigBuilder::new().max_undo(0).build(),
            Err(ConfigError::InvalidParameter {
                parameter: "max_undo",
                ..
            })
        ));
        assert!(matches!(
            SessionConfigBuilder::new().gzip_level(12).build(),
            Err(ConfigError::InvalidParameter {
                parameter: "gzip_level",
                ..
            })
        ));
    }

    #[test]
    fn load_reads_kebab_case_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max-undo = 5\ngzip-level = 1").unwrap();
        let parsed = SessionConfigFile::load(file.path()).unwrap();
        let config = SessionConfigBuilder::from_file(&parsed).build().unwrap();
        assert_eq!(config.max_undo, 5);
        assert_eq!(config.gzip_level, 1);
        assert!(config.canonicalize_filename);
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "undo-depth = 5").unwrap();
        assert!(matches!(
            SessionConfigFile::load(file.path()),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            SessionConfigFile::load(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
