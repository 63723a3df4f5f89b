use super::config::SessionConfig;
use super::error::{FileError, FileErrorKind};
use super::event::{ModelEvent, ModelObserver, ObserverList};
use super::plugins::PluginRegistry;
use crate::core::io::compression::{self, CompressedWriter, FileFormat, FormatError};
use crate::core::io::traits::{DumpRequest, FilterError, LoadedScene};
use crate::core::kinds::molecular::{FOLDER, TARGETS, UNIVERSE};
use crate::core::models::ids::NodeId;
use crate::core::models::kind::{KindCatalog, KindError, NodeKind};
use crate::core::models::tree::{SceneTree, TreeError};
use crate::core::models::value::PropertyValue;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds an empty scene with a fresh universe and folder.
pub fn blank_scene(kinds: &KindCatalog) -> Result<LoadedScene, KindError> {
    let mut tree = SceneTree::new();
    let universe = tree.create(kinds.get(UNIVERSE)?);
    let folder = tree.create(kinds.get(FOLDER)?);
    Ok(LoadedScene {
        tree,
        universe,
        folder,
    })
}

/// Detached copies kept for pasting, in a tree of their own so closing the
/// document leaves them alone.
#[derive(Debug, Default)]
struct Clipboard {
    tree: SceneTree,
    roots: Vec<NodeId>,
}

/// The document being edited: the node arena, its two roots, the selection
/// and the file it came from.
///
/// Every structural change, selection change and change-notifying property
/// write is reported to the registered observers after the model is back in
/// a consistent state.
#[derive(Debug, Default)]
pub struct Model {
    tree: SceneTree,
    universe: Option<NodeId>,
    folder: Option<NodeId>,
    selection: Vec<NodeId>,
    filename: Option<PathBuf>,
    observers: ObserverList,
    clipboard: Clipboard,
}

impl Model {
    /// Creates a model without roots. Call [`file_new`](Self::file_new) to
    /// get an editable document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn universe(&self) -> Option<NodeId> {
        self.universe
    }

    pub fn folder(&self) -> Option<NodeId> {
        self.folder
    }

    /// Present roots, universe first.
    pub fn roots(&self) -> Vec<NodeId> {
        self.universe.into_iter().chain(self.folder).collect()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn add_observer(&mut self, observer: Rc<dyn ModelObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&mut self, observer: &Rc<dyn ModelObserver>) {
        self.observers.remove(observer);
    }

    fn emit(&self, event: ModelEvent) {
        self.observers.notify(&event);
    }

    // --- nodes ---

    /// Creates a detached node. It joins the model once attached under a root.
    pub fn create_node(&mut self, kind: Arc<NodeKind>) -> NodeId {
        self.tree.create(kind)
    }

    /// Deep-copies a subtree into new detached nodes.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        self.tree.clone_subtree(id)
    }

    /// Deep-copies several subtrees with one id mapping, so links between
    /// them point at the copies.
    pub fn clone_subtrees(&mut self, roots: &[NodeId]) -> Result<Vec<NodeId>, TreeError> {
        self.tree.clone_subtrees(roots)
    }

    /// Frees a detached subtree.
    pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.tree.discard(id)
    }

    pub fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<usize, TreeError> {
        let position = self.tree.attach_child(parent, child, index)?;
        self.emit(ModelEvent::TreeChanged);
        Ok(position)
    }

    /// Moves `node` under `parent` at `index`. The node stays selected as
    /// long as its new place is inside the model; a failed attach puts it
    /// back where it was.
    ///
    /// # Return
    ///
    /// The old and the new `(parent, index)`.
    pub fn move_node(
        &mut self,
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<((NodeId, usize), (NodeId, usize)), TreeError> {
        let old_parent = self
            .tree
            .get(node)?
            .parent()
            .ok_or(TreeError::NoParent(node))?;
        let old_index = self.tree.detach_child(old_parent, node)?;
        let position = match self.tree.attach_child(parent, node, index) {
            Ok(position) => position,
            Err(e) => {
                if let Err(restore) = self.tree.attach_child(old_parent, node, Some(old_index)) {
                    warn!(error = %restore, "Could not restore node after failed move");
                }
                self.emit(ModelEvent::TreeChanged);
                return Err(e);
            }
        };

        let still_in_model = self.tree.node(node).is_some_and(|n| n.is_in_model());
        let mut deselected = false;
        if !still_in_model {
            let moved = self.tree.subtree(node);
            let before = self.selection.len();
            self.selection.retain(|id| !moved.contains(id));
            deselected = self.selection.len() != before;
        }
        self.emit(ModelEvent::TreeChanged);
        if deselected {
            self.emit(ModelEvent::SelectionChanged);
        }
        Ok(((old_parent, old_index), (parent, position)))
    }

    /// Detaches `child` from its parent and drops its subtree from the selection.
    ///
    /// # Return
    ///
    /// The former parent and the index the child occupied.
    pub fn detach(&mut self, child: NodeId) -> Result<(NodeId, usize), TreeError> {
        let parent = self
            .tree
            .get(child)?
            .parent()
            .ok_or(TreeError::NoParent(child))?;
        let removed = self.tree.subtree(child);
        let index = self.tree.detach_child(parent, child)?;

        let before = self.selection.len();
        self.selection.retain(|id| !removed.contains(id));
        let deselected = self.selection.len() != before;

        self.emit(ModelEvent::TreeChanged);
        if deselected {
            self.emit(ModelEvent::SelectionChanged);
        }
        Ok((parent, index))
    }

    pub fn get_property(&self, id: NodeId, name: &str) -> Result<PropertyValue, TreeError> {
        self.tree.get_property(id, name)
    }

    /// Writes a property and returns the previous stored value.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue, TreeError> {
        let change = self.tree.set_property(id, name, value)?;
        if change.emits_change {
            self.emit(ModelEvent::PropertyChanged {
                node: id,
                name: name.to_string(),
            });
        }
        Ok(change.previous)
    }

    /// Resolves a slash-separated child index path such as `/universe/0/2`.
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let mut parts = path.trim_matches('/').split('/');
        let mut current = match parts.next()? {
            "universe" => self.universe?,
            "folder" => self.folder?,
            _ => return None,
        };
        for part in parts.filter(|p| !p.is_empty()) {
            let index: usize = part.parse().ok()?;
            current = *self.tree.children_of(current).get(index)?;
        }
        Some(current)
    }

    /// Inverse of [`resolve_path`](Self::resolve_path).
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut chain = self.tree.ancestors(id);
        chain.reverse();
        chain.push(id);
        let root = *chain.first()?;
        let mut path = if Some(root) == self.universe {
            String::from("/universe")
        } else if Some(root) == self.folder {
            String::from("/folder")
        } else {
            return None;
        };
        for &node in &chain[1..] {
            path.push('/');
            path.push_str(&self.tree.index_of(node)?.to_string());
        }
        Some(path)
    }

    // --- selection ---

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(&id)
    }

    /// Appends `id` to the selection. Selecting a selected node is a no-op.
    pub fn select(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.tree.get(id)?.is_in_model() {
            return Err(TreeError::NotInModel(id));
        }
        if !self.selection.contains(&id) {
            self.selection.push(id);
            self.emit(ModelEvent::SelectionChanged);
        }
        Ok(())
    }

    /// Removes `id` from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, id: NodeId) -> bool {
        let before = self.selection.len();
        self.selection.retain(|&s| s != id);
        let changed = self.selection.len() != before;
        if changed {
            self.emit(ModelEvent::SelectionChanged);
        }
        changed
    }

    /// Replaces the selection. Duplicates are dropped, order is kept.
    pub fn set_selection(&mut self, ids: &[NodeId]) -> Result<(), TreeError> {
        for &id in ids {
            if !self.tree.get(id)?.is_in_model() {
                return Err(TreeError::NotInModel(id));
            }
        }
        let mut selection = Vec::with_capacity(ids.len());
        for &id in ids {
            if !selection.contains(&id) {
                selection.push(id);
            }
        }
        if selection != self.selection {
            self.selection = selection;
            self.emit(ModelEvent::SelectionChanged);
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.emit(ModelEvent::SelectionChanged);
        }
    }

    // --- clipboard ---

    pub fn clipboard_is_empty(&self) -> bool {
        self.clipboard.roots.is_empty()
    }

    /// Kinds of the top-level clipboard nodes, in copy order.
    pub fn clipboard_kinds(&self) -> Vec<Arc<NodeKind>> {
        let tree = &self.clipboard.tree;
        self.clipboard
            .roots
            .iter()
            .filter_map(|&id| tree.node(id))
            .map(|n| n.kind_arc().clone())
            .collect()
    }

    /// Replaces the clipboard with copies of `nodes` and their subtrees.
    /// A bond is left out unless every atom it links is copied along.
    ///
    /// # Return
    ///
    /// The number of top-level nodes on the clipboard.
    pub fn copy_to_clipboard(&mut self, nodes: &[NodeId]) -> Result<usize, TreeError> {
        let copied: HashSet<NodeId> = nodes.iter().flat_map(|&n| self.tree.subtree(n)).collect();
        let mut kept = Vec::with_capacity(nodes.len());
        for &id in nodes {
            let node = self.tree.get(id)?;
            let complete = !node.kind().capabilities().referent
                || node
                    .stored(TARGETS)
                    .and_then(PropertyValue::as_nodes)
                    .is_none_or(|targets| targets.iter().all(|t| copied.contains(t)));
            if complete {
                kept.push(id);
            }
        }

        let mut tree = SceneTree::new();
        let roots = tree.import_subtrees(&self.tree, &kept)?;
        debug!(
            copied = roots.len(),
            skipped = nodes.len() - kept.len(),
            "Filled clipboard"
        );
        let count = roots.len();
        self.clipboard = Clipboard { tree, roots };
        Ok(count)
    }

    /// Detached copies of the clipboard nodes that `parent` accepts. The
    /// clipboard itself is left as it is, so it can be pasted again.
    pub fn paste_from_clipboard(&mut self, parent: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let parent_kind = self.tree.get(parent)?.kind_arc().clone();
        let source = &self.clipboard.tree;
        let accepted: Vec<NodeId> = self
            .clipboard
            .roots
            .iter()
            .copied()
            .filter(|&id| source.node(id).is_some_and(|n| parent_kind.check_add(n.kind())))
            .collect();
        if accepted.len() != self.clipboard.roots.len() {
            debug!(
                rejected = self.clipboard.roots.len() - accepted.len(),
                "Parent does not accept every clipboard node"
            );
        }
        self.tree.import_subtrees(source, &accepted)
    }

    // --- files ---

    fn install(&mut self, scene: LoadedScene) -> Result<(), TreeError> {
        let LoadedScene {
            mut tree,
            universe,
            folder,
        } = scene;
        tree.set_model_root(universe, true)?;
        tree.set_model_root(folder, true)?;
        self.tree = tree;
        self.universe = Some(universe);
        self.folder = Some(folder);
        Ok(())
    }

    /// Closes the current document and installs `scene` as a new, unnamed one.
    pub fn file_new(&mut self, scene: LoadedScene) -> Result<(), TreeError> {
        self.file_close();
        self.install(scene)?;
        info!("Started a new model");
        self.emit(ModelEvent::FileNew);
        Ok(())
    }

    fn resolve(&self, filename: &str, about: &str) -> Result<FileFormat, FileError> {
        compression::resolve_format(filename).map_err(|e| match e {
            FormatError::NoExtension => FileError::new(about, FileErrorKind::NoExtension),
        })
    }

    /// Loads `path` with the filter registered for its extension.
    ///
    /// The current document is only closed once loading has succeeded; on
    /// error the model is left as it was.
    pub fn file_open(
        &mut self,
        path: &Path,
        registry: &PluginRegistry,
        config: &SessionConfig,
    ) -> Result<(), FileError> {
        let filename = path.to_string_lossy().into_owned();
        self.emit(ModelEvent::FileOpening {
            filename: filename.clone(),
        });
        let about = format!("Could not open file '{}'", filename);

        let format = self.resolve(&filename, &about)?;
        let filter = registry.load_filter(&format.extension).map_err(|_| {
            FileError::new(
                &about,
                FileErrorKind::UnknownExtension(format.extension.clone()),
            )
        })?;
        let mut reader = compression::open_reader(path, format.compression)
            .map_err(|e| FileError::new(&about, e.into()))?;
        let scene = filter
            .load(&mut reader, registry.kinds())
            .map_err(|e| FileError::new(&about, e.into()))?;

        self.file_close();
        self.install(scene)
            .map_err(|e| FileError::new(&about, FilterError::from(e).into()))?;
        self.filename = Some(if config.canonicalize_filename {
            normalize(path)
        } else {
            path.to_path_buf()
        });
        info!(file = %filename, nodes = self.tree.len(), "Opened model");
        self.emit(ModelEvent::FileOpened { filename });
        Ok(())
    }

    /// Writes the model (or just `nodes`) to `path`, or to the current
    /// filename when `path` is `None`.
    pub fn file_save(
        &mut self,
        path: Option<&Path>,
        nodes: Option<&[NodeId]>,
        registry: &PluginRegistry,
        config: &SessionConfig,
    ) -> Result<(), FileError> {
        let target = match path.map(Path::to_path_buf).or_else(|| self.filename.clone()) {
            Some(target) => target,
            None => {
                return Err(FileError::new(
                    "Could not save file",
                    FileErrorKind::NoFilename,
                ));
            }
        };
        let filename = target.to_string_lossy().into_owned();
        self.emit(ModelEvent::FileSaving {
            filename: filename.clone(),
        });
        let about = format!("Could not save to file '{}'", filename);

        let (Some(universe), Some(folder)) = (self.universe, self.folder) else {
            return Err(FileError::new(about, FileErrorKind::NoModel));
        };
        let format = self.resolve(&filename, &about)?;
        let filter = registry.dump_filter(&format.extension).map_err(|_| {
            FileError::new(
                &about,
                FileErrorKind::UnknownExtension(format.extension.clone()),
            )
        })?;

        let mut writer = CompressedWriter::create(&target, format.compression, config.gzip_level)
            .map_err(|e| FileError::new(&about, e.into()))?;
        let request = DumpRequest {
            tree: &self.tree,
            universe,
            folder,
            nodes,
        };
        if let Err(e) = filter.dump(&mut writer, &request) {
            warn!(file = %filename, "Dump failed, output may be incomplete");
            return Err(FileError::new(about, e.into()));
        }
        writer
            .finish()
            .map_err(|e| FileError::new(&about, e.into()))?;

        self.filename = Some(target);
        info!(file = %filename, "Saved model");
        self.emit(ModelEvent::FileSaved { filename });
        Ok(())
    }

    /// Drops both roots, the selection and the filename.
    pub fn file_close(&mut self) {
        self.emit(ModelEvent::FileClosing);
        self.universe = None;
        self.folder = None;
        self.filename = None;
        self.selection.clear();
        self.tree = SceneTree::new();
        debug!("Closed model");
        self.emit(ModelEvent::FileClosed);
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
