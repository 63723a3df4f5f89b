use super::ids::NodeId;
use nalgebra::{Isometry3, Matrix3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The declared type of a property.
///
/// Every property in a kind's table has exactly one `ValueKind`; values written
/// to the property are checked against it before any write hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    /// A 3-vector in Angstrom.
    Vector,
    /// RGBA colour with components in `[0, 1]`.
    Color,
    /// A 3x3 matrix, e.g. the cell vectors of a periodic universe (as columns).
    Matrix,
    /// Three independent switches, e.g. which cell vectors are active.
    Flags,
    /// A rigid-body transformation relative to the parent frame.
    Transform,
    /// An ordered list of links to other nodes.
    Nodes,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ValueKind::Bool => "bool",
                ValueKind::Int => "int",
                ValueKind::Float => "float",
                ValueKind::Text => "text",
                ValueKind::Vector => "vector",
                ValueKind::Color => "color",
                ValueKind::Matrix => "matrix",
                ValueKind::Flags => "flags",
                ValueKind::Transform => "transform",
                ValueKind::Nodes => "nodes",
            }
        )
    }
}

#[derive(Debug, Error)]
#[error("Invalid value kind string")]
pub struct ParseValueKindError;

impl FromStr for ValueKind {
    type Err = ParseValueKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "text" | "string" => Ok(Self::Text),
            "vector" => Ok(Self::Vector),
            "color" | "colour" => Ok(Self::Color),
            "matrix" => Ok(Self::Matrix),
            "flags" => Ok(Self::Flags),
            "transform" => Ok(Self::Transform),
            "nodes" => Ok(Self::Nodes),
            _ => Err(ParseValueKindError),
        }
    }
}

/// A property value.
///
/// Values are owned: reading a property hands out a clone, so a value captured
/// for undo can never be changed by later in-place edits of the node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Sentinel for optional properties that fall back to a kind-specific default.
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector(Vector3<f64>),
    Color([f64; 4]),
    Matrix(Matrix3<f64>),
    Flags([bool; 3]),
    Transform(Isometry3<f64>),
    Nodes(Vec<NodeId>),
}

impl PropertyValue {
    /// Returns the kind of this value, or `None` for [`PropertyValue::Undefined`].
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            PropertyValue::Undefined => None,
            PropertyValue::Bool(_) => Some(ValueKind::Bool),
            PropertyValue::Int(_) => Some(ValueKind::Int),
            PropertyValue::Float(_) => Some(ValueKind::Float),
            PropertyValue::Text(_) => Some(ValueKind::Text),
            PropertyValue::Vector(_) => Some(ValueKind::Vector),
            PropertyValue::Color(_) => Some(ValueKind::Color),
            PropertyValue::Matrix(_) => Some(ValueKind::Matrix),
            PropertyValue::Flags(_) => Some(ValueKind::Flags),
            PropertyValue::Transform(_) => Some(ValueKind::Transform),
            PropertyValue::Nodes(_) => Some(ValueKind::Nodes),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, PropertyValue::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<&Isometry3<f64>> {
        match self {
            PropertyValue::Transform(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&[NodeId]> {
        match self {
            PropertyValue::Nodes(ids) => Some(ids),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Undefined => write!(f, "undefined"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Text(s) => write!(f, "{:?}", s),
            PropertyValue::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            PropertyValue::Color([r, g, b, a]) => write!(f, "rgba({}, {}, {}, {})", r, g, b, a),
            PropertyValue::Matrix(m) => write!(
                f,
                "[{}, {}, {}; {}, {}, {}; {}, {}, {}]",
                m[(0, 0)],
                m[(0, 1)],
                m[(0, 2)],
                m[(1, 0)],
                m[(1, 1)],
                m[(1, 2)],
                m[(2, 0)],
                m[(2, 1)],
                m[(2, 2)]
            ),
            PropertyValue::Flags([a, b, c]) => write!(f, "[{}, {}, {}]", a, b, c),
            PropertyValue::Transform(t) => {
                let v = t.translation.vector;
                write!(
                    f,
                    "translate({}, {}, {}) rotate({})",
                    v.x,
                    v.y,
                    v.z,
                    t.rotation.angle()
                )
            }
            PropertyValue::Nodes(ids) => write!(f, "<{} node(s)>", ids.len()),
        }
    }
}
