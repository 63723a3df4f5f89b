use crate::error::{CliError, Result};
use std::path::Path;
use tracing::debug;
use zeoforge::engine::config::{SessionConfig, SessionConfigBuilder, SessionConfigFile};

/// Values given on the command line; they win over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub max_undo: Option<usize>,
    pub gzip_level: Option<u32>,
    pub set_values: Vec<String>,
}

/// Session settings as read from an optional file, before CLI overrides.
#[derive(Debug, Default, Clone)]
pub struct PartialSessionConfig {
    file: SessionConfigFile,
}

impl PartialSessionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let file = SessionConfigFile::load(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(Self { file })
    }

    /// Reads `path` if given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(mut self, overrides: &ConfigOverrides) -> Result<SessionConfig> {
        self.apply_set_values(&overrides.set_values)?;

        let mut builder = SessionConfigBuilder::from_file(&self.file);
        if let Some(depth) = overrides.max_undo {
            builder = builder.max_undo(depth);
        }
        if let Some(level) = overrides.gzip_level {
            builder = builder.gzip_level(level);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "max-undo" => {
                    self.file.max_undo = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                "gzip-level" => {
                    self.file.gzip_level = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                "canonicalize-filename" => {
                    self.file.canonicalize_filename = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid boolean value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
