use super::ids::NodeId;
use super::kind::NodeKind;
use super::node::Node;
use super::value::{PropertyValue, ValueKind};
use nalgebra::Isometry3;
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("Node {0:?} is already attached")]
    AlreadyAttached(NodeId),
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("A '{parent_kind}' node does not accept a '{child_kind}' child")]
    Rejected {
        parent_kind: String,
        child_kind: String,
    },
    #[error("Kind '{kind}' has no property '{property}'")]
    UnknownProperty { kind: String, property: String },
    #[error("Property '{property}' expects a {expected} value, got {found}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        found: String,
    },
    #[error("Invalid value for property '{property}': {message}")]
    Validation { property: String, message: String },
    #[error("Node {0:?} is still attached and cannot be discarded")]
    DiscardAttached(NodeId),
    #[error("Node {0:?} is not part of the model")]
    NotInModel(NodeId),
    #[error("Node {0:?} has no parent")]
    NoParent(NodeId),
}

/// Result of a successful [`SceneTree::set_property`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    /// Value stored before the write (raw, without the read hook applied).
    pub previous: PropertyValue,
    /// Whether the property is declared as change-notifying.
    pub emits_change: bool,
}

/// Structural and property snapshot of a subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: String,
    pub values: Vec<(String, PropertyValue)>,
    pub children: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkPolicy {
    KeepOutside,
    DropOutside,
}

struct PlannedNode {
    original: NodeId,
    kind: Arc<NodeKind>,
    values: Vec<PropertyValue>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Nodes to copy, parents before children.
#[derive(Default)]
struct CopyPlan {
    roots: Vec<NodeId>,
    nodes: Vec<PlannedNode>,
}

/// Arena owning every node of a model, attached or not.
///
/// All structural changes go through this type so that the parent/child links
/// and the `in_model` flag stay consistent: a node is in the model exactly when
/// it lies in the child closure of a node marked as a model root.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: SlotMap<NodeId, Node>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached node of the given kind.
    pub fn create(&mut self, kind: Arc<NodeKind>) -> NodeId {
        self.nodes.insert(Node::new(kind))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Like [`node`](Self::node) but reports a missing node as an error.
    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Position of `id` within its parent's child list.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|&c| c == id)
    }

    /// Ancestors of `id`, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent_of(p);
        }
        out
    }

    /// Returns `true` if `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    /// All nodes of the subtree rooted at `id`, in pre-order, `id` first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev());
        }
        out
    }

    /// Inserts `child` into `parent`'s children.
    ///
    /// # Arguments
    ///
    /// * `parent` - The receiving container.
    /// * `child` - A detached node.
    /// * `index` - Insert position, clamped to `[0, len]`; `None` appends.
    ///
    /// # Return
    ///
    /// The index the child ended up at.
    ///
    /// # Errors
    ///
    /// `AlreadyAttached` if `child` has a parent or is a model root, `Cycle` if
    /// `parent` lies inside `child`'s subtree, `Rejected` if the parent kind
    /// refuses the child kind.
    pub fn attach_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<usize, TreeError> {
        let parent_node = self.get(parent)?;
        let child_node = self.get(child)?;
        if child_node.parent.is_some() || child_node.in_model {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        if !parent_node.kind().check_add(child_node.kind()) {
            return Err(TreeError::Rejected {
                parent_kind: parent_node.kind().name().to_string(),
                child_kind: child_node.kind().name().to_string(),
            });
        }
        let in_model = parent_node.in_model;

        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or(TreeError::NodeNotFound(parent))?;
        let position = index
            .unwrap_or(parent_node.children.len())
            .min(parent_node.children.len());
        parent_node.children.insert(position, child);

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
        self.propagate_in_model(child, in_model);
        Ok(position)
    }

    /// Removes `child` from `parent`'s children and detaches its subtree.
    ///
    /// # Return
    ///
    /// The index the child occupied.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.get(child)?;
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or(TreeError::NodeNotFound(parent))?;
        let position = parent_node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        parent_node.children.remove(position);

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        self.propagate_in_model(child, false);
        Ok(position)
    }

    /// Marks a parentless node (and its subtree) as a model root or clears it.
    pub(crate) fn set_model_root(&mut self, id: NodeId, in_model: bool) -> Result<(), TreeError> {
        let node = self.get(id)?;
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(id));
        }
        self.propagate_in_model(id, in_model);
        Ok(())
    }

    fn propagate_in_model(&mut self, root: NodeId, in_model: bool) {
        for id in self.subtree(root) {
            if let Some(node) = self.nodes.get_mut(id) {
                node.in_model = in_model;
            }
        }
    }

    /// Returns whether `parent` would accept a child of kind `candidate`.
    pub fn check_add(&self, parent: NodeId, candidate: &NodeKind) -> Result<bool, TreeError> {
        Ok(self.get(parent)?.kind().check_add(candidate))
    }

    /// Reads a property through its read hook.
    pub fn get_property(&self, id: NodeId, name: &str) -> Result<PropertyValue, TreeError> {
        let node = self.get(id)?;
        let (index, prop) =
            node.kind()
                .property(name)
                .ok_or_else(|| TreeError::UnknownProperty {
                    kind: node.kind().name().to_string(),
                    property: name.to_string(),
                })?;
        Ok(prop.read(node, &node.values[index]))
    }

    /// Type-checks and writes a property through its write hook.
    ///
    /// On error the node is left untouched.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyChange, TreeError> {
        let kind = self.get(id)?.kind_arc().clone();
        let (index, prop) = kind
            .property(name)
            .ok_or_else(|| TreeError::UnknownProperty {
                kind: kind.name().to_string(),
                property: name.to_string(),
            })?;
        if !prop.accepts(&value) {
            return Err(TreeError::TypeMismatch {
                property: name.to_string(),
                expected: prop.kind(),
                found: value
                    .kind()
                    .map_or_else(|| "undefined".to_string(), |k| k.to_string()),
            });
        }
        let node = self.nodes.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        let stored = prop
            .write(node, value)
            .map_err(|message| TreeError::Validation {
                property: name.to_string(),
                message,
            })?;
        let previous = std::mem::replace(&mut node.values[index], stored);
        Ok(PropertyChange {
            previous,
            emits_change: prop.emits_change(),
        })
    }

    /// Frees a detached subtree.
    pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.get(id)?;
        if node.parent.is_some() || node.in_model {
            return Err(TreeError::DiscardAttached(id));
        }
        for victim in self.subtree(id) {
            self.nodes.remove(victim);
        }
        Ok(())
    }

    /// Deep-copies a subtree into new detached nodes.
    ///
    /// Node links (`Nodes` values) pointing inside the copied subtree are
    /// redirected to the copies; links pointing outside are kept.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        self.clone_subtrees(&[id])?
            .pop()
            .ok_or(TreeError::NodeNotFound(id))
    }

    /// Deep-copies several subtrees as one unit, returning one detached copy
    /// per root in the order given.
    ///
    /// A single id mapping spans all the subtrees, so a link from one copied
    /// subtree into another (a bond between two copied atoms) points at the
    /// copies. Roots nested inside an earlier root are copied once, as part of
    /// the enclosing subtree, and are not returned separately.
    pub fn clone_subtrees(&mut self, roots: &[NodeId]) -> Result<Vec<NodeId>, TreeError> {
        let plan = self.plan_copy(roots)?;
        Ok(self.realize(plan, LinkPolicy::KeepOutside))
    }

    /// Copies subtrees of another arena into this one as detached nodes.
    ///
    /// Links between the copied nodes are remapped like in
    /// [`clone_subtrees`](Self::clone_subtrees); links to nodes that were not
    /// copied mean nothing here and are dropped.
    pub fn import_subtrees(
        &mut self,
        source: &SceneTree,
        roots: &[NodeId],
    ) -> Result<Vec<NodeId>, TreeError> {
        let plan = source.plan_copy(roots)?;
        Ok(self.realize(plan, LinkPolicy::DropOutside))
    }

    fn plan_copy(&self, roots: &[NodeId]) -> Result<CopyPlan, TreeError> {
        let mut plan = CopyPlan::default();
        let mut seen: HashSet<NodeId> = HashSet::new();
        for &root in roots {
            self.get(root)?;
            if seen.contains(&root) {
                continue;
            }
            plan.roots.push(root);
            for id in self.subtree(root) {
                if !seen.insert(id) {
                    continue;
                }
                let node = self.get(id)?;
                plan.nodes.push(PlannedNode {
                    original: id,
                    kind: node.kind_arc().clone(),
                    values: node.values.clone(),
                    parent: if id == root { None } else { node.parent },
                    children: node.children.clone(),
                });
            }
        }
        Ok(plan)
    }

    fn realize(&mut self, plan: CopyPlan, links: LinkPolicy) -> Vec<NodeId> {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(plan.nodes.len());
        for planned in &plan.nodes {
            let id = self.nodes.insert(Node::new(planned.kind.clone()));
            mapping.insert(planned.original, id);
        }
        for planned in plan.nodes {
            let Some(node) = mapping
                .get(&planned.original)
                .and_then(|&id| self.nodes.get_mut(id))
            else {
                continue;
            };
            node.parent = planned.parent.and_then(|p| mapping.get(&p).copied());
            node.children = planned
                .children
                .iter()
                .filter_map(|c| mapping.get(c).copied())
                .collect();
            node.values = planned.values;
            for value in &mut node.values {
                if let PropertyValue::Nodes(targets) = value {
                    if links == LinkPolicy::DropOutside {
                        targets.retain(|t| mapping.contains_key(t));
                    }
                    for target in targets.iter_mut() {
                        if let Some(&mapped) = mapping.get(target) {
                            *target = mapped;
                        }
                    }
                }
            }
        }
        plan.roots
            .iter()
            .filter_map(|root| mapping.get(root).copied())
            .collect()
    }

    /// Snapshot of kinds, stored values and child order below `id`.
    pub fn snapshot(&self, id: NodeId) -> Result<NodeSnapshot, TreeError> {
        let node = self.get(id)?;
        let values = node
            .kind()
            .properties()
            .iter()
            .zip(node.values.iter())
            .map(|(p, v)| (p.name().to_string(), v.clone()))
            .collect();
        let children = node
            .children
            .iter()
            .map(|&c| self.snapshot(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeSnapshot {
            id,
            kind: node.kind().name().to_string(),
            values,
            children,
        })
    }

    /// Local frame of a node: its `transformation` property, or identity.
    pub fn local_transform(&self, id: NodeId) -> Isometry3<f64> {
        self.node(id)
            .and_then(|n| n.stored("transformation"))
            .and_then(PropertyValue::as_transform)
            .copied()
            .unwrap_or_else(Isometry3::identity)
    }

    /// Frame of a node relative to the root of its tree.
    pub fn absolute_transform(&self, id: NodeId) -> Isometry3<f64> {
        let mut chain = self.ancestors(id);
        chain.reverse();
        chain.push(id);
        chain
            .into_iter()
            .fold(Isometry3::identity(), |acc, n| acc * self.local_transform(n))
    }
}
