use super::action::{Action, Step};
use super::cache::{FactValue, SelectionCache, SelectionView};
use super::config::SessionConfig;
use super::error::EngineError;
use super::history::ActionManager;
use super::model::{Model, blank_scene};
use super::plugins::PluginRegistry;
use super::primitive::PrimitiveAction;
use crate::core::models::ids::NodeId;
use std::path::Path;
use std::rc::Rc;
use tracing::{info, instrument};

/// The single editing session: registry, model, history, selection cache
/// and configuration.
///
/// The cache is registered as a model observer for the lifetime of the
/// session, so every fact read through [`view`](Self::view) reflects the
/// live tree. File operations reset the history.
#[derive(Debug)]
pub struct EditSession {
    registry: PluginRegistry,
    model: Model,
    history: ActionManager,
    cache: Rc<SelectionCache>,
    config: SessionConfig,
}

impl EditSession {
    /// Starts a session on a new, empty model.
    pub fn new(registry: PluginRegistry, config: SessionConfig) -> Result<Self, EngineError> {
        let cache = Rc::new(SelectionCache::new());
        let mut model = Model::new();
        model.add_observer(cache.clone());
        let history = ActionManager::new(config.max_undo);
        let mut session = Self {
            registry,
            model,
            history,
            cache,
            config,
        };
        session.file_new()?;
        Ok(session)
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn history(&self) -> &ActionManager {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cache(&self) -> &SelectionCache {
        &self.cache
    }

    /// Memoized facts about the current selection.
    pub fn view(&self) -> SelectionView<'_> {
        SelectionView::new(&self.model, &self.cache)
    }

    /// Evaluates a registered cache plugin for the current selection.
    pub fn plugin_fact(&self, name: &str) -> Result<FactValue, EngineError> {
        let plugin = self.registry.cache_plugin(name)?;
        Ok(self.cache.plugin_fact(&self.model, plugin.as_ref()))
    }

    // --- editing ---

    /// Creates a detached node of a registered kind. Attaching it is the
    /// undoable step.
    pub fn create_node(&mut self, kind: &str) -> Result<NodeId, EngineError> {
        let kind = self.registry.kind(kind)?;
        Ok(self.model.create_node(kind))
    }

    /// Runs a registered action by name.
    pub fn execute(&mut self, name: &str) -> Result<Step, EngineError> {
        let action = self.registry.action(name)?;
        self.execute_action(action)
    }

    /// Runs an action that is not (or need not be) looked up in the registry,
    /// such as a parametrised edit.
    pub fn execute_action(&mut self, action: Rc<dyn Action>) -> Result<Step, EngineError> {
        self.history.execute(action, &mut self.model, &self.cache)
    }

    pub fn execute_primitive(&mut self, action: PrimitiveAction) -> Result<Step, EngineError> {
        self.history.execute_primitive(action, &mut self.model)
    }

    pub fn undo(&mut self) -> Result<Step, EngineError> {
        self.history.undo(&mut self.model)
    }

    pub fn redo(&mut self) -> Result<Step, EngineError> {
        self.history.redo(&mut self.model)
    }

    pub fn repeat(&mut self) -> Result<Step, EngineError> {
        self.history.repeat(&mut self.model, &self.cache)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    // --- selection ---

    pub fn select(&mut self, id: NodeId) -> Result<(), EngineError> {
        Ok(self.model.select(id)?)
    }

    pub fn deselect(&mut self, id: NodeId) -> bool {
        self.model.deselect(id)
    }

    pub fn set_selection(&mut self, ids: &[NodeId]) -> Result<(), EngineError> {
        Ok(self.model.set_selection(ids)?)
    }

    pub fn clear_selection(&mut self) {
        self.model.clear_selection();
    }

    /// Replaces the selection with the nodes at `paths` (see
    /// [`Model::resolve_path`]).
    pub fn select_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<(), EngineError> {
        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let id = self.model.resolve_path(path).ok_or_else(|| {
                EngineError::NotApplicable {
                    action: "select".to_string(),
                    reason: format!("no node at '{}'", path),
                }
            })?;
            ids.push(id);
        }
        self.set_selection(&ids)
    }

    // --- files ---

    pub fn file_new(&mut self) -> Result<(), EngineError> {
        let scene = blank_scene(self.registry.kinds())?;
        self.model.file_new(scene)?;
        self.history.clear();
        self.history.mark_saved();
        Ok(())
    }

    /// Opens `path`; on failure the current model and history are kept.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn file_open(&mut self, path: &Path) -> Result<(), EngineError> {
        self.model.file_open(path, &self.registry, &self.config)?;
        self.history.clear();
        self.history.mark_saved();
        Ok(())
    }

    /// Saves the whole model to `path`, or to the current filename.
    #[instrument(skip(self))]
    pub fn file_save(&mut self, path: Option<&Path>) -> Result<(), EngineError> {
        self.model.file_save(path, None, &self.registry, &self.config)?;
        self.history.mark_saved();
        Ok(())
    }

    /// Writes only `nodes` (and their subtrees) to `path`. The save point is
    /// left alone since the model itself was not saved.
    pub fn file_save_nodes(&mut self, path: &Path, nodes: &[NodeId]) -> Result<(), EngineError> {
        self.model
            .file_save(Some(path), Some(nodes), &self.registry, &self.config)?;
        Ok(())
    }

    pub fn file_close(&mut self) {
        self.model.file_close();
        self.history.clear();
        info!("Session closed its model");
    }
}
