use super::event::{ModelEvent, ModelObserver};
use super::model::Model;
use crate::core::kinds::mixins;
use crate::core::kinds::molecular::TARGETS;
use crate::core::models::ids::NodeId;
use crate::core::models::value::PropertyValue;
use nalgebra::Isometry3;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Value produced by a [`CachePlugin`].
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Bool(bool),
    Count(usize),
    Float(f64),
    Node(Option<NodeId>),
    Nodes(Vec<NodeId>),
    Text(String),
}

/// An extra selection-derived fact, memoized alongside the built-in ones.
pub trait CachePlugin {
    fn name(&self) -> &str;
    fn compute(&self, model: &Model) -> FactValue;
}

/// Direct, non-memoized computations of every selection fact.
pub mod facts {
    use super::*;

    pub fn is_fixed(model: &Model, id: NodeId) -> bool {
        let tree = model.tree();
        let Some(node) = tree.node(id) else {
            return false;
        };
        if node.kind().capabilities().fixed {
            return true;
        }
        std::iter::once(id)
            .chain(tree.ancestors(id))
            .filter_map(|n| tree.node(n))
            .any(mixins::is_locked)
    }

    pub fn nodes(model: &Model) -> Vec<NodeId> {
        model.selection().to_vec()
    }

    pub fn node(model: &Model) -> Option<NodeId> {
        match model.selection() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn parent(model: &Model) -> Option<NodeId> {
        let tree = model.tree();
        let (first, rest) = model.selection().split_first()?;
        let parent = tree.parent_of(*first)?;
        rest.iter()
            .all(|&n| tree.parent_of(n) == Some(parent))
            .then_some(parent)
    }

    pub fn common_parent(model: &Model) -> Option<NodeId> {
        let tree = model.tree();
        let (first, rest) = model.selection().split_first()?;
        tree.ancestors(*first)
            .into_iter()
            .find(|&candidate| rest.iter().all(|&n| tree.ancestors(n).contains(&candidate)))
    }

    pub fn nodes_without_children(model: &Model) -> Vec<NodeId> {
        let tree = model.tree();
        let selection = model.selection();
        selection
            .iter()
            .copied()
            .filter(|&n| !tree.ancestors(n).iter().any(|a| selection.contains(a)))
            .collect()
    }

    pub fn some_nodes_fixed(model: &Model) -> bool {
        model.selection().iter().any(|&n| is_fixed(model, n))
    }

    pub fn some_nodes_without_children_fixed(model: &Model) -> bool {
        nodes_without_children(model)
            .into_iter()
            .any(|n| is_fixed(model, n))
    }

    pub fn neighbours(model: &Model) -> Vec<NodeId> {
        let Some(parent) = parent(model) else {
            return Vec::new();
        };
        model
            .tree()
            .children_of(parent)
            .iter()
            .copied()
            .filter(|c| !model.is_selected(*c))
            .collect()
    }

    pub fn transformed_neighbours(model: &Model) -> Vec<NodeId> {
        with_transform(model, neighbours(model))
    }

    pub fn some_neighbours_fixed(model: &Model) -> bool {
        neighbours(model).into_iter().any(|n| is_fixed(model, n))
    }

    pub fn bonded_neighbours(model: &Model) -> Vec<NodeId> {
        let tree = model.tree();
        let mut out = Vec::new();
        let in_tree_order = model.roots().into_iter().flat_map(|r| tree.subtree(r));
        for id in in_tree_order {
            let Some(node) = tree.node(id) else { continue };
            if !node.kind().capabilities().referent {
                continue;
            }
            let Some(targets) = node.stored(TARGETS).and_then(PropertyValue::as_nodes) else {
                continue;
            };
            if !targets.iter().any(|t| model.is_selected(*t)) {
                continue;
            }
            for &t in targets {
                if !model.is_selected(t) && !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }

    pub fn children(model: &Model) -> Vec<NodeId> {
        node(model)
            .map(|n| model.tree().children_of(n).to_vec())
            .unwrap_or_default()
    }

    pub fn transformed_children(model: &Model) -> Vec<NodeId> {
        with_transform(model, children(model))
    }

    pub fn child_transforms(model: &Model) -> Vec<Isometry3<f64>> {
        transformed_children(model)
            .into_iter()
            .map(|c| model.tree().local_transform(c))
            .collect()
    }

    pub fn some_children_fixed(model: &Model) -> bool {
        children(model).into_iter().any(|n| is_fixed(model, n))
    }

    pub fn highest_index(model: &Model) -> Option<usize> {
        parent(model)?;
        model
            .selection()
            .iter()
            .filter_map(|&n| model.tree().index_of(n))
            .max()
    }

    fn with_transform(model: &Model, ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.into_iter()
            .filter(|&n| {
                model
                    .tree()
                    .node(n)
                    .is_some_and(|node| node.kind().capabilities().transform)
            })
            .collect()
    }
}

#[derive(Default)]
struct Memo {
    nodes: Option<Vec<NodeId>>,
    node: Option<Option<NodeId>>,
    parent: Option<Option<NodeId>>,
    common_parent: Option<Option<NodeId>>,
    nodes_without_children: Option<Vec<NodeId>>,
    some_nodes_fixed: Option<bool>,
    some_nodes_without_children_fixed: Option<bool>,
    neighbours: Option<Vec<NodeId>>,
    transformed_neighbours: Option<Vec<NodeId>>,
    some_neighbours_fixed: Option<bool>,
    bonded_neighbours: Option<Vec<NodeId>>,
    children: Option<Vec<NodeId>>,
    transformed_children: Option<Vec<NodeId>>,
    child_transforms: Option<Vec<Isometry3<f64>>>,
    some_children_fixed: Option<bool>,
    highest_index: Option<Option<usize>>,
    plugins: HashMap<String, FactValue>,
}

/// Memoized selection facts with a single dirty flag.
///
/// Every accessor takes the model it reads from. After
/// [`queue_invalidate`](Self::queue_invalidate) all memoized values are gone
/// and the next read recomputes from the live tree. Register the cache as a
/// [`ModelObserver`] to have tree, selection and signalled property changes
/// invalidate it automatically.
#[derive(Default)]
pub struct SelectionCache {
    memo: RefCell<Memo>,
    dirty: Cell<bool>,
    invalidations: Cell<usize>,
}

macro_rules! fact {
    ($(#[$doc:meta])* $name:ident -> $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self, model: &Model) -> $ty {
            self.memoized(|m| &mut m.$name, || facts::$name(model))
        }
    };
}

impl SelectionCache {
    pub fn new() -> Self {
        Self {
            dirty: Cell::new(true),
            ..Default::default()
        }
    }

    /// Drops every memoized fact. Repeated calls before the next read are
    /// coalesced into one.
    pub fn queue_invalidate(&self) {
        if self.dirty.get() {
            return;
        }
        *self.memo.borrow_mut() = Memo::default();
        self.dirty.set(true);
        self.invalidations.set(self.invalidations.get() + 1);
        trace!("Selection cache invalidated");
    }

    /// `true` when no fact has been computed since the last invalidation.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Number of effective (non-coalesced) invalidations so far.
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.get()
    }

    fn memoized<T: Clone>(
        &self,
        slot: impl Fn(&mut Memo) -> &mut Option<T>,
        compute: impl FnOnce() -> T,
    ) -> T {
        let cached = slot(&mut self.memo.borrow_mut()).clone();
        if let Some(value) = cached {
            return value;
        }
        let value = compute();
        *slot(&mut self.memo.borrow_mut()) = Some(value.clone());
        self.dirty.set(false);
        value
    }

    fact!(
        /// The selected nodes, in selection order.
        nodes -> Vec<NodeId>
    );
    fact!(
        /// The sole selected node, if exactly one is selected.
        node -> Option<NodeId>
    );
    fact!(
        /// Parent shared by every selected node.
        parent -> Option<NodeId>
    );
    fact!(
        /// Deepest node that is a strict ancestor of every selected node.
        common_parent -> Option<NodeId>
    );
    fact!(
        /// Selected nodes that have no selected ancestor.
        nodes_without_children -> Vec<NodeId>
    );
    fact!(some_nodes_fixed -> bool);
    fact!(some_nodes_without_children_fixed -> bool);
    fact!(
        /// Unselected children of the shared parent.
        neighbours -> Vec<NodeId>
    );
    fact!(transformed_neighbours -> Vec<NodeId>);
    fact!(some_neighbours_fixed -> bool);
    fact!(
        /// Unselected nodes linked to the selection through a referent such as a bond.
        bonded_neighbours -> Vec<NodeId>
    );
    fact!(
        /// Children of the sole selected node.
        children -> Vec<NodeId>
    );
    fact!(transformed_children -> Vec<NodeId>);
    fact!(
        /// Local frames of `transformed_children`, in the same order.
        child_transforms -> Vec<Isometry3<f64>>
    );
    fact!(some_children_fixed -> bool);
    fact!(
        /// Largest child index among selected nodes under the shared parent.
        highest_index -> Option<usize>
    );

    /// Value of a plugin fact, computed on first access after invalidation.
    pub fn plugin_fact(&self, model: &Model, plugin: &dyn CachePlugin) -> FactValue {
        let cached = self.memo.borrow().plugins.get(plugin.name()).cloned();
        if let Some(value) = cached {
            return value;
        }
        let value = plugin.compute(model);
        self.memo
            .borrow_mut()
            .plugins
            .insert(plugin.name().to_string(), value.clone());
        self.dirty.set(false);
        value
    }
}

impl ModelObserver for SelectionCache {
    fn on_model_event(&self, event: &ModelEvent) {
        if event.invalidates_selection() {
            self.queue_invalidate();
        }
    }
}

impl fmt::Debug for SelectionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCache")
            .field("dirty", &self.dirty.get())
            .field("invalidations", &self.invalidations.get())
            .finish()
    }
}

/// Read-only view pairing a model with its selection cache.
#[derive(Clone, Copy)]
pub struct SelectionView<'a> {
    pub model: &'a Model,
    pub cache: &'a SelectionCache,
}

impl<'a> SelectionView<'a> {
    pub fn new(model: &'a Model, cache: &'a SelectionCache) -> Self {
        Self { model, cache }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.cache.nodes(self.model)
    }
    pub fn node(&self) -> Option<NodeId> {
        self.cache.node(self.model)
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.cache.parent(self.model)
    }
    pub fn common_parent(&self) -> Option<NodeId> {
        self.cache.common_parent(self.model)
    }
    pub fn nodes_without_children(&self) -> Vec<NodeId> {
        self.cache.nodes_without_children(self.model)
    }
    pub fn some_nodes_fixed(&self) -> bool {
        self.cache.some_nodes_fixed(self.model)
    }
    pub fn some_nodes_without_children_fixed(&self) -> bool {
        self.cache.some_nodes_without_children_fixed(self.model)
    }
    pub fn neighbours(&self) -> Vec<NodeId> {
        self.cache.neighbours(self.model)
    }
    pub fn some_neighbours_fixed(&self) -> bool {
        self.cache.some_neighbours_fixed(self.model)
    }
    pub fn bonded_neighbours(&self) -> Vec<NodeId> {
        self.cache.bonded_neighbours(self.model)
    }
    pub fn children(&self) -> Vec<NodeId> {
        self.cache.children(self.model)
    }
    pub fn transformed_children(&self) -> Vec<NodeId> {
        self.cache.transformed_children(self.model)
    }
    pub fn some_children_fixed(&self) -> bool {
        self.cache.some_children_fixed(self.model)
    }
    pub fn highest_index(&self) -> Option<usize> {
        self.cache.highest_index(self.model)
    }
}
