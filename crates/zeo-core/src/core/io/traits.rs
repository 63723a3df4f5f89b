use crate::core::models::ids::NodeId;
use crate::core::models::kind::{KindCatalog, KindError};
use crate::core::models::tree::{SceneTree, TreeError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Scene error: {0}")]
    Tree(#[from] TreeError),
    #[error("Kind error: {0}")]
    Kind(#[from] KindError),
    #[error("Unsupported content: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid integer (value: '{0}')")]
    InvalidInt(String),
    #[error("Invalid float (value: '{0}')")]
    InvalidFloat(String),
    #[error("Unknown element '{0}'")]
    UnknownElement(String),
    #[error("Expected {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("File ended after {found} of {expected} records")]
    Truncated { expected: usize, found: usize },
}

/// A freshly loaded scene: its own arena plus the two root nodes.
///
/// The roots are parentless and not yet marked as model roots; the model does
/// that when it adopts the scene.
#[derive(Debug)]
pub struct LoadedScene {
    pub tree: SceneTree,
    pub universe: NodeId,
    pub folder: NodeId,
}

/// What a dump filter is asked to write.
#[derive(Debug, Clone, Copy)]
pub struct DumpRequest<'a> {
    pub tree: &'a SceneTree,
    pub universe: NodeId,
    pub folder: NodeId,
    /// Restricts the output to these nodes (and their subtrees) when set.
    pub nodes: Option<&'a [NodeId]>,
}

impl DumpRequest<'_> {
    /// Top-level nodes to write: the explicit subset, or the universe.
    pub fn roots(&self) -> Vec<NodeId> {
        match self.nodes {
            Some(nodes) => nodes.to_vec(),
            None => vec![self.universe],
        }
    }
}

/// Reads a scene from a stream.
pub trait LoadFilter {
    /// Registry name, also the primary file extension.
    fn name(&self) -> &str;

    /// Human readable format description.
    fn description(&self) -> &str;

    /// Parses `reader` into a new scene built from the kinds in `kinds`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is malformed, if reading fails, or if
    /// a kind the format needs is missing from the catalog.
    fn load(&self, reader: &mut dyn BufRead, kinds: &KindCatalog)
    -> Result<LoadedScene, FilterError>;
}

/// Writes a scene to a stream.
pub trait DumpFilter {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Serialises the requested part of the scene to `writer`.
    fn dump(&self, writer: &mut dyn Write, request: &DumpRequest<'_>) -> Result<(), FilterError>;
}
