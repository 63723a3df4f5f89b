pub mod convert;
pub mod edit;
pub mod show;

use crate::error::Result;
use std::path::Path;
use tracing::info;
use zeoforge::engine::config::SessionConfig;
use zeoforge::engine::error::EngineError;
use zeoforge::engine::session::EditSession;
use zeoforge::workflows::builtin::builtin_registry;

/// Starts a session with the built-in plugin and opens `input` in it.
pub fn open_session(input: &Path, config: SessionConfig) -> Result<EditSession> {
    let registry = builtin_registry().map_err(EngineError::from)?;
    let mut session = EditSession::new(registry, config)?;
    info!("Loading model from {:?}", input);
    session.file_open(input)?;
    Ok(session)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const WATER: &str = "3\nwater\nO 0.0 0.0 0.0\nH 0.757 0.586 0.0\nH -0.757 0.586 0.0\n";

    pub fn write_water(dir: &Path) -> PathBuf {
        let path = dir.join("water.xyz");
        fs::write(&path, WATER).unwrap();
        path
    }
}
