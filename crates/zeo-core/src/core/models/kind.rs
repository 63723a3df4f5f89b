use super::property::Property;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KindError {
    #[error("Kind '{kind}' declares property '{property}' more than once")]
    DuplicateProperty { kind: String, property: String },
    #[error("Kind name must not be empty")]
    EmptyName,
    #[error("Kind '{0}' is already in the catalog")]
    DuplicateKind(String),
    #[error("Kind '{0}' is not in the catalog")]
    UnknownKind(String),
}

/// What a node kind is allowed to do in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can own children.
    pub container: bool,
    /// Cannot be moved, deleted or duplicated by generic edit actions.
    pub fixed: bool,
    /// Carries a `transformation` property that defines a local frame.
    pub transform: bool,
    /// Carries a `targets` property linking other nodes (e.g. a bond).
    pub referent: bool,
}

/// Policy deciding whether a container accepts children of a given kind.
pub type AcceptPolicy = fn(&NodeKind) -> bool;

/// A node kind: a name, a capability set and a property table.
///
/// Property order is fixed at build time; nodes store their values in the same
/// order, so a property's index doubles as the slot of its value.
pub struct NodeKind {
    name: String,
    capabilities: Capabilities,
    properties: Vec<Property>,
    index: HashMap<String, usize>,
    accepts: Option<AcceptPolicy>,
}

impl NodeKind {
    pub fn builder(name: impl Into<String>) -> NodeKindBuilder {
        NodeKindBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<(usize, &Property)> {
        self.index.get(name).map(|&i| (i, &self.properties[i]))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns whether a node of this kind may receive a child of `candidate`.
    ///
    /// Non-container kinds never accept children. Containers without an
    /// explicit policy accept every kind.
    pub fn check_add(&self, candidate: &NodeKind) -> bool {
        if !self.capabilities.container {
            return false;
        }
        self.accepts.is_none_or(|policy| policy(candidate))
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKind")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("properties", &self.properties)
            .finish()
    }
}

impl PartialEq for NodeKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Default)]
pub struct NodeKindBuilder {
    name: String,
    capabilities: Capabilities,
    properties: Vec<Property>,
    accepts: Option<AcceptPolicy>,
}

impl NodeKindBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn container(mut self) -> Self {
        self.capabilities.container = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.capabilities.fixed = true;
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: impl IntoIterator<Item = Property>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn accepts(mut self, policy: AcceptPolicy) -> Self {
        self.accepts = Some(policy);
        self
    }

    pub fn build(self) -> Result<NodeKind, KindError> {
        if self.name.is_empty() {
            return Err(KindError::EmptyName);
        }
        let mut index = HashMap::with_capacity(self.properties.len());
        for (i, prop) in self.properties.iter().enumerate() {
            if index.insert(prop.name().to_string(), i).is_some() {
                return Err(KindError::DuplicateProperty {
                    kind: self.name,
                    property: prop.name().to_string(),
                });
            }
        }
        Ok(NodeKind {
            name: self.name,
            capabilities: self.capabilities,
            properties: self.properties,
            index,
            accepts: self.accepts,
        })
    }
}

/// Name-indexed set of node kinds available to a session.
#[derive(Debug, Default, Clone)]
pub struct KindCatalog {
    kinds: HashMap<String, Arc<NodeKind>>,
}

impl KindCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: NodeKind) -> Result<Arc<NodeKind>, KindError> {
        if self.kinds.contains_key(kind.name()) {
            return Err(KindError::DuplicateKind(kind.name().to_string()));
        }
        let kind = Arc::new(kind);
        self.kinds.insert(kind.name().to_string(), kind.clone());
        Ok(kind)
    }

    pub fn get(&self, name: &str) -> Result<Arc<NodeKind>, KindError> {
        self.kinds
            .get(name)
            .cloned()
            .ok_or_else(|| KindError::UnknownKind(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
