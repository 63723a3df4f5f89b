use super::ids::NodeId;
use super::kind::NodeKind;
use super::value::PropertyValue;
use std::sync::Arc;

/// A scene-graph node.
///
/// Structural fields (`parent`, `children`, `in_model`) are maintained by
/// [`SceneTree`](super::tree::SceneTree); they are readable here but only the
/// tree may change them.
#[derive(Debug, Clone)]
pub struct Node {
    kind: Arc<NodeKind>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) in_model: bool,
    pub(crate) values: Vec<PropertyValue>,
    draw_dirty: bool,
}

impl Node {
    /// Creates a detached node with every property set to a fresh default.
    pub fn new(kind: Arc<NodeKind>) -> Self {
        let values = kind.properties().iter().map(|p| p.default_value()).collect();
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            in_model: false,
            values,
            draw_dirty: true,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_arc(&self) -> &Arc<NodeKind> {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_in_model(&self) -> bool {
        self.in_model
    }

    /// Raw stored value, bypassing the read hook.
    pub fn stored(&self, name: &str) -> Option<&PropertyValue> {
        self.kind.property(name).map(|(i, _)| &self.values[i])
    }

    /// Display name: the `name` property when present and non-empty, else the kind name.
    pub fn label(&self) -> String {
        match self.stored("name").and_then(PropertyValue::as_text) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.kind.name().to_string(),
        }
    }

    pub fn is_draw_dirty(&self) -> bool {
        self.draw_dirty
    }

    /// Flags derived drawing state as stale. Called from write hooks.
    pub fn invalidate_draw(&mut self) {
        self.draw_dirty = true;
    }

    /// Clears the drawing flag once an external renderer has consumed it.
    pub fn clear_draw_dirty(&mut self) {
        self.draw_dirty = false;
    }
}
