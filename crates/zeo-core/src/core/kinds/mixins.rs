//! Property groups shared by several node kinds.

use crate::core::models::node::Node;
use crate::core::models::property::Property;
use crate::core::models::value::{PropertyValue, ValueKind};
use nalgebra::Isometry3;

pub const NAME: &str = "name";
pub const VISIBLE: &str = "visible";
pub const TRANSFORMATION: &str = "transformation";
pub const USER_COLOR: &str = "user_color";
pub const LOCKED: &str = "locked";

const FALLBACK_COLOR: [f64; 4] = [0.7, 0.7, 0.7, 1.0];

pub(crate) fn redraw(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    node.invalidate_draw();
    Ok(value)
}

fn check_color(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    let in_range = match &value {
        PropertyValue::Color(rgba) => rgba.iter().all(|c| (0.0..=1.0).contains(c)),
        _ => true,
    };
    if !in_range {
        return Err("color components must lie in [0, 1]".to_string());
    }
    redraw(node, value)
}

/// `name` and `visible`, carried by every kind.
pub fn common() -> Vec<Property> {
    vec![
        Property::new(NAME, ValueKind::Text, || PropertyValue::Text(String::new())).signal(),
        Property::new(VISIBLE, ValueKind::Bool, || PropertyValue::Bool(true))
            .with_writer(redraw)
            .signal(),
    ]
}

/// The local frame of a node relative to its parent.
pub fn transform() -> Vec<Property> {
    vec![
        Property::new(TRANSFORMATION, ValueKind::Transform, || {
            PropertyValue::Transform(Isometry3::identity())
        })
        .with_writer(redraw)
        .signal(),
    ]
}

/// An optional user colour. `Undefined` means "use the kind's default".
pub fn color() -> Vec<Property> {
    vec![
        Property::new(USER_COLOR, ValueKind::Color, || PropertyValue::Undefined)
            .with_writer(check_color)
            .optional()
            .signal(),
    ]
}

/// A lock that makes the node and its subtree fixed for generic edits.
pub fn locked() -> Vec<Property> {
    vec![Property::new(LOCKED, ValueKind::Bool, || PropertyValue::Bool(false)).signal()]
}

/// Colour to draw a node with: the user colour when set, else `default`.
pub fn effective_color(node: &Node, default: Option<[f64; 4]>) -> [f64; 4] {
    match node.stored(USER_COLOR) {
        Some(PropertyValue::Color(rgba)) => *rgba,
        _ => default.unwrap_or(FALLBACK_COLOR),
    }
}

/// Whether the node itself carries `locked == true`.
pub fn is_locked(node: &Node) -> bool {
    node.stored(LOCKED)
        .and_then(PropertyValue::as_bool)
        .unwrap_or(false)
}
