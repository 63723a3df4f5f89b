use thiserror::Error;

use super::config::ConfigError;
use super::plugins::PluginError;
use crate::core::io::traits::FilterError;
use crate::core::models::kind::KindError;
use crate::core::models::tree::TreeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Scene error: {0}")]
    Tree(#[from] TreeError),

    #[error("Kind error: {0}")]
    Kind(#[from] KindError),

    #[error("{0}")]
    File(#[from] FileError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Action '{action}' cannot run: {reason}")]
    NotApplicable { action: String, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

/// A failed file operation, displayed as `about:\nreason`.
#[derive(Debug, Error)]
#[error("{about}:\n{kind}")]
pub struct FileError {
    pub about: String,
    #[source]
    pub kind: FileErrorKind,
}

impl FileError {
    pub fn new(about: impl Into<String>, kind: FileErrorKind) -> Self {
        Self {
            about: about.into(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum FileErrorKind {
    #[error("Filename does not have an extension. Could not determine fileformat.")]
    NoExtension,
    #[error("Extension {0} not recognized. Could not determine fileformat.")]
    UnknownExtension(String),
    #[error("One needs a filename to save to.")]
    NoFilename,
    #[error("There is no open model to save.")]
    NoModel,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Filter(#[from] FilterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_error_displays_context_then_reason() {
        let err = FileError::new(
            "Could not open file 'a.pdb'",
            FileErrorKind::UnknownExtension("pdb".into()),
        );
        assert_eq!(
            err.to_string(),
            "Could not open file 'a.pdb':\nExtension pdb not recognized. Could not determine fileformat."
        );
    }

    #[test]
    fn engine_error_wraps_tree_errors() {
        let err: EngineError = TreeError::NoParent(Default::default()).into();
        assert!(matches!(err, EngineError::Tree(TreeError::NoParent(_))));
    }
}
