use super::node::Node;
use super::value::{PropertyValue, ValueKind};
use std::fmt;

/// Produces a fresh default value for one node.
pub type DefaultFactory = fn() -> PropertyValue;
/// Maps the stored value to the value seen by readers.
pub type ReadHook = fn(&Node, &PropertyValue) -> PropertyValue;
/// Validates an incoming value and returns the value to store.
///
/// The hook may mutate the node (e.g. mark its drawing state dirty). An `Err`
/// carries a human readable validation message and leaves the node unchanged.
pub type WriteHook = fn(&mut Node, PropertyValue) -> Result<PropertyValue, String>;

/// One entry of a node kind's property table.
#[derive(Clone)]
pub struct Property {
    name: String,
    kind: ValueKind,
    default: DefaultFactory,
    reader: Option<ReadHook>,
    writer: Option<WriteHook>,
    emits_change: bool,
    optional: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: ValueKind, default: DefaultFactory) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
            reader: None,
            writer: None,
            emits_change: false,
            optional: false,
        }
    }

    pub fn with_reader(mut self, reader: ReadHook) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_writer(mut self, writer: WriteHook) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Marks the property as change-notifying: every successful write is
    /// reported to the model's observers.
    pub fn signal(mut self) -> Self {
        self.emits_change = true;
        self
    }

    /// Allows [`PropertyValue::Undefined`] as a stored value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn emits_change(&self) -> bool {
        self.emits_change
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Calls the default factory. Each call yields an independent value.
    pub fn default_value(&self) -> PropertyValue {
        (self.default)()
    }

    /// Returns `true` if `value` may be stored in this property.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match value.kind() {
            Some(kind) => kind == self.kind,
            None => self.optional,
        }
    }

    pub(crate) fn read(&self, node: &Node, stored: &PropertyValue) -> PropertyValue {
        match self.reader {
            Some(reader) => reader(node, stored),
            None => stored.clone(),
        }
    }

    pub(crate) fn write(&self, node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
        match self.writer {
            Some(writer) => writer(node, value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_reader", &self.reader.is_some())
            .field("has_writer", &self.writer.is_some())
            .field("emits_change", &self.emits_change)
            .field("optional", &self.optional)
            .finish()
    }
}
