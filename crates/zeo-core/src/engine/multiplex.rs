use super::model::Model;
use crate::core::models::ids::NodeId;
use crate::core::models::value::PropertyValue;
use std::fmt;

/// A property read over several nodes at once.
#[derive(Debug, Clone, PartialEq)]
pub enum Multiplexed {
    /// Every node holds this value.
    Uniform(PropertyValue),
    /// The nodes disagree.
    Ambiguous,
    /// The property cannot be edited for this set: no nodes, or some node
    /// does not declare it.
    Insensitive,
}

impl Multiplexed {
    pub fn read(model: &Model, nodes: &[NodeId], name: &str) -> Self {
        let mut values = nodes.iter().map(|&n| model.get_property(n, name));
        let common = match values.next() {
            Some(Ok(value)) => value,
            _ => return Multiplexed::Insensitive,
        };
        let mut ambiguous = false;
        for value in values {
            match value {
                Ok(v) if v == common => {}
                Ok(_) => ambiguous = true,
                Err(_) => return Multiplexed::Insensitive,
            }
        }
        if ambiguous {
            Multiplexed::Ambiguous
        } else {
            Multiplexed::Uniform(common)
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Multiplexed::Insensitive)
    }
}

impl fmt::Display for Multiplexed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplexed::Uniform(v) => write!(f, "{}", v),
            Multiplexed::Ambiguous => write!(f, ":::ambiguous:::"),
            Multiplexed::Insensitive => write!(f, ":::insensitive:::"),
        }
    }
}
