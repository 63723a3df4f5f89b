use super::cache::{SelectionCache, SelectionView};
use super::model::Model;
use super::primitive::{self, AppliedAction, PrimitiveAction};
use crate::core::models::ids::NodeId;
use crate::core::models::kind::NodeKind;
use crate::core::models::tree::TreeError;
use crate::core::models::value::PropertyValue;
use nalgebra::Isometry3;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collects the primitives an action applies so they can be recorded as one
/// undo entry, or reverted together if the action fails.
pub struct Transaction<'a> {
    model: &'a mut Model,
    cache: &'a SelectionCache,
    applied: Vec<AppliedAction>,
    created: Vec<NodeId>,
}

impl<'a> Transaction<'a> {
    pub fn new(model: &'a mut Model, cache: &'a SelectionCache) -> Self {
        Self {
            model,
            cache,
            applied: Vec::new(),
            created: Vec::new(),
        }
    }

    pub fn model(&self) -> &Model {
        self.model
    }

    /// Selection facts for the model as it is right now.
    pub fn view(&self) -> SelectionView<'_> {
        SelectionView::new(self.model, self.cache)
    }

    pub fn apply(&mut self, action: PrimitiveAction) -> Result<(), TreeError> {
        let done = action.apply(self.model)?;
        self.applied.push(done);
        Ok(())
    }

    pub fn add(&mut self, node: NodeId, parent: NodeId, index: Option<usize>) -> Result<(), TreeError> {
        self.apply(PrimitiveAction::Add {
            node,
            parent,
            index,
        })
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.apply(PrimitiveAction::Remove { node })
    }

    pub fn reparent(
        &mut self,
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        self.apply(PrimitiveAction::Reparent {
            node,
            parent,
            index,
        })
    }

    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), TreeError> {
        self.apply(PrimitiveAction::SetProperty {
            node,
            name: name.to_string(),
            value,
        })
    }

    pub fn transform(&mut self, node: NodeId, transformation: Isometry3<f64>) -> Result<(), TreeError> {
        self.apply(PrimitiveAction::Transform {
            node,
            transformation,
        })
    }

    /// Creates a detached node that is freed again if the transaction rolls back.
    pub fn create_node(&mut self, kind: Arc<NodeKind>) -> NodeId {
        let id = self.model.create_node(kind);
        self.created.push(id);
        id
    }

    /// Deep-copies a subtree; the copy is freed again if the transaction rolls back.
    pub fn clone_subtree(&mut self, node: NodeId) -> Result<NodeId, TreeError> {
        let id = self.model.clone_subtree(node)?;
        self.created.push(id);
        Ok(id)
    }

    /// Deep-copies several subtrees as one unit (see
    /// [`SceneTree::clone_subtrees`](crate::core::models::tree::SceneTree::clone_subtrees)).
    pub fn clone_subtrees(&mut self, roots: &[NodeId]) -> Result<Vec<NodeId>, TreeError> {
        let copies = self.model.clone_subtrees(roots)?;
        self.created.extend(copies.iter().copied());
        Ok(copies)
    }

    /// Fills the clipboard. Not recorded: undo leaves the clipboard as it is.
    pub fn copy_to_clipboard(&mut self, nodes: &[NodeId]) -> Result<usize, TreeError> {
        self.model.copy_to_clipboard(nodes)
    }

    /// Detached copies of the clipboard nodes `parent` accepts; freed again
    /// if the transaction rolls back.
    pub fn paste_clipboard(&mut self, parent: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let copies = self.model.paste_from_clipboard(parent)?;
        self.created.extend(copies.iter().copied());
        Ok(copies)
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Finishes the transaction. Returns `None` when nothing was applied.
    pub fn commit(mut self) -> Option<AppliedAction> {
        match self.applied.len() {
            0 => None,
            1 => self.applied.pop(),
            _ => Some(AppliedAction::Batch(std::mem::take(&mut self.applied))),
        }
    }

    /// Reverts every applied primitive, newest first, and frees created nodes.
    pub fn rollback(self) {
        debug!(steps = self.applied.len(), "Rolling back transaction");
        primitive::rollback(self.model, self.applied);
        free_created(self.model, self.created);
    }
}

/// Frees nodes created during a transaction, newest first. A node that is
/// still attached is kept and reported.
fn free_created(model: &mut Model, created: Vec<NodeId>) {
    for id in created.into_iter().rev() {
        if !model.tree().contains(id) {
            continue;
        }
        if let Err(e) = model.discard(id) {
            warn!(node = ?id, error = %e, "Could not free a node created by the transaction");
        }
    }
}
