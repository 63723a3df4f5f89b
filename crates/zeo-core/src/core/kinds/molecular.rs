use super::elements::{self, MAX_ATOMIC_NUMBER};
use super::mixins::{self, redraw};
use crate::core::models::kind::{Capabilities, KindError, NodeKind};
use crate::core::models::node::Node;
use crate::core::models::property::Property;
use crate::core::models::value::{PropertyValue, ValueKind};
use nalgebra::Matrix3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const UNIVERSE: &str = "Universe";
pub const FOLDER: &str = "Folder";
pub const FRAME: &str = "Frame";
pub const ATOM: &str = "Atom";
pub const BOND: &str = "Bond";
pub const POINT: &str = "Point";
pub const NOTE: &str = "Note";

pub const NUMBER: &str = "number";
pub const TARGETS: &str = "targets";
pub const BOND_TYPE: &str = "bond_type";
pub const CELL: &str = "cell";
pub const CELL_ACTIVE: &str = "cell_active";
pub const TEXT: &str = "text";

const DEFAULT_CELL_EDGE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondType {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
    Hybrid,
    Hydrogen,
}

#[derive(Debug, Error)]
#[error("Invalid bond type string")]
pub struct ParseBondTypeError;

impl FromStr for BondType {
    type Err = ParseBondTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            "hy" | "hybrid" => Ok(Self::Hybrid),
            "hb" | "hydrogen" => Ok(Self::Hydrogen),
            _ => Err(ParseBondTypeError),
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
                Self::Hybrid => "Hybrid",
                Self::Hydrogen => "Hydrogen",
            }
        )
    }
}

fn write_number(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    match value.as_int() {
        Some(n) if (1..=MAX_ATOMIC_NUMBER).contains(&n) => redraw(node, value),
        Some(n) => Err(format!(
            "atomic number {} outside 1..={}",
            n, MAX_ATOMIC_NUMBER
        )),
        None => Err("atomic number must be an integer".to_string()),
    }
}

fn write_targets(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    if let Some(targets) = value.as_nodes() {
        if targets.len() > 2 {
            return Err(format!("a bond links two nodes, got {}", targets.len()));
        }
        if targets.len() == 2 && targets[0] == targets[1] {
            return Err("a bond cannot link a node to itself".to_string());
        }
    }
    redraw(node, value)
}

fn write_bond_type(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    let text = value.as_text().unwrap_or_default();
    let parsed: BondType = text
        .parse()
        .map_err(|_| format!("unknown bond type '{}'", text))?;
    redraw(node, PropertyValue::Text(parsed.to_string()))
}

fn write_cell(node: &mut Node, value: PropertyValue) -> Result<PropertyValue, String> {
    if let PropertyValue::Matrix(m) = &value {
        if m.determinant().abs() < 1e-8 {
            return Err("cell vectors must be linearly independent".to_string());
        }
    }
    redraw(node, value)
}

fn accepts_molecular(kind: &NodeKind) -> bool {
    matches!(kind.name(), FRAME | ATOM | BOND | POINT)
}

fn accepts_notes(kind: &NodeKind) -> bool {
    matches!(kind.name(), FOLDER | NOTE)
}

fn universe() -> Result<NodeKind, KindError> {
    NodeKind::builder(UNIVERSE)
        .container()
        .fixed()
        .accepts(accepts_molecular)
        .properties(mixins::common())
        .property(
            Property::new(CELL, ValueKind::Matrix, || {
                PropertyValue::Matrix(Matrix3::identity() * DEFAULT_CELL_EDGE)
            })
            .with_writer(write_cell)
            .signal(),
        )
        .property(
            Property::new(CELL_ACTIVE, ValueKind::Flags, || {
                PropertyValue::Flags([false; 3])
            })
            .with_writer(redraw)
            .signal(),
        )
        .build()
}

fn folder() -> Result<NodeKind, KindError> {
    NodeKind::builder(FOLDER)
        .container()
        .fixed()
        .accepts(accepts_notes)
        .properties(mixins::common())
        .build()
}

fn frame() -> Result<NodeKind, KindError> {
    NodeKind::builder(FRAME)
        .capabilities(Capabilities {
            container: true,
            transform: true,
            ..Default::default()
        })
        .accepts(accepts_molecular)
        .properties(mixins::common())
        .properties(mixins::transform())
        .properties(mixins::locked())
        .build()
}

fn atom() -> Result<NodeKind, KindError> {
    NodeKind::builder(ATOM)
        .capabilities(Capabilities {
            transform: true,
            ..Default::default()
        })
        .properties(mixins::common())
        .properties(mixins::transform())
        .properties(mixins::color())
        .properties(mixins::locked())
        .property(
            Property::new(NUMBER, ValueKind::Int, || PropertyValue::Int(6))
                .with_writer(write_number)
                .signal(),
        )
        .build()
}

fn bond() -> Result<NodeKind, KindError> {
    NodeKind::builder(BOND)
        .capabilities(Capabilities {
            referent: true,
            ..Default::default()
        })
        .properties(mixins::common())
        .properties(mixins::color())
        .property(
            Property::new(TARGETS, ValueKind::Nodes, || PropertyValue::Nodes(Vec::new()))
                .with_writer(write_targets)
                .signal(),
        )
        .property(
            Property::new(BOND_TYPE, ValueKind::Text, || {
                PropertyValue::Text(BondType::default().to_string())
            })
            .with_writer(write_bond_type),
        )
        .build()
}

fn point() -> Result<NodeKind, KindError> {
    NodeKind::builder(POINT)
        .capabilities(Capabilities {
            transform: true,
            ..Default::default()
        })
        .properties(mixins::common())
        .properties(mixins::transform())
        .properties(mixins::color())
        .build()
}

fn note() -> Result<NodeKind, KindError> {
    NodeKind::builder(NOTE)
        .properties(mixins::common())
        .property(Property::new(TEXT, ValueKind::Text, || {
            PropertyValue::Text(String::new())
        }))
        .build()
}

/// Every built-in node kind, roots first.
pub fn molecular_kinds() -> Result<Vec<NodeKind>, KindError> {
    Ok(vec![
        universe()?,
        folder()?,
        frame()?,
        atom()?,
        bond()?,
        point()?,
        note()?,
    ])
}

/// Drawing colour of an atom: user colour, element colour, or grey.
pub fn atom_color(node: &Node) -> [f64; 4] {
    let element = node
        .stored(NUMBER)
        .and_then(PropertyValue::as_int)
        .and_then(elements::default_color);
    mixins::effective_color(node, element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::kind::KindCatalog;
    use crate::core::models::tree::{SceneTree, TreeError};

    fn catalog() -> KindCatalog {
        let mut catalog = KindCatalog::new();
        for kind in molecular_kinds().unwrap() {
            catalog.insert(kind).unwrap();
        }
        catalog
    }

    mod bond_type {
        use super::*;

        #[test]
        fn from_str_parses_aliases() {
            assert_eq!("1".parse::<BondType>().unwrap(), BondType::Single);
            assert_eq!("D".parse::<BondType>().unwrap(), BondType::Double);
            assert_eq!("ar".parse::<BondType>().unwrap(), BondType::Aromatic);
            assert_eq!("hb".parse::<BondType>().unwrap(), BondType::Hydrogen);
            assert!("quadruple".parse::<BondType>().is_err());
        }

        #[test]
        fn display_round_trips_through_from_str() {
            for t in [
                BondType::Single,
                BondType::Double,
                BondType::Triple,
                BondType::Aromatic,
                BondType::Hybrid,
                BondType::Hydrogen,
            ] {
                assert_eq!(t.to_string().parse::<BondType>().unwrap(), t);
            }
        }
    }

    mod kinds {
        use super::*;

        #[test]
        fn containment_policies() {
            let c = catalog();
            let universe = c.get(UNIVERSE).unwrap();
            let folder = c.get(FOLDER).unwrap();
            let frame = c.get(FRAME).unwrap();
            let atom = c.get(ATOM).unwrap();
            let note = c.get(NOTE).unwrap();

            assert!(universe.check_add(&frame));
            assert!(universe.check_add(&atom));
            assert!(!universe.check_add(&note));
            assert!(folder.check_add(&note));
            assert!(!folder.check_add(&atom));
            assert!(frame.check_add(&frame));
            assert!(!atom.check_add(&atom));
        }

        #[test]
        fn capabilities_match_roles() {
            let c = catalog();
            assert!(c.get(UNIVERSE).unwrap().capabilities().fixed);
            assert!(c.get(FOLDER).unwrap().capabilities().fixed);
            assert!(c.get(FRAME).unwrap().capabilities().transform);
            assert!(c.get(BOND).unwrap().capabilities().referent);
            assert!(!c.get(ATOM).unwrap().capabilities().container);
        }

        #[test]
        fn atom_number_is_validated() {
            let c = catalog();
            let mut tree = SceneTree::new();
            let atom = tree.create(c.get(ATOM).unwrap());
            tree.set_property(atom, NUMBER, PropertyValue::Int(14)).unwrap();
            assert!(matches!(
                tree.set_property(atom, NUMBER, PropertyValue::Int(0)),
                Err(TreeError::Validation { .. })
            ));
            assert!(matches!(
                tree.set_property(atom, NUMBER, PropertyValue::Int(119)),
                Err(TreeError::Validation { .. })
            ));
            assert_eq!(
                tree.get_property(atom, NUMBER).unwrap(),
                PropertyValue::Int(14)
            );
        }

        #[test]
        fn bond_targets_and_type_are_validated() {
            let c = catalog();
            let mut tree = SceneTree::new();
            let a = tree.create(c.get(ATOM).unwrap());
            let b = tree.create(c.get(ATOM).unwrap());
            let bond = tree.create(c.get(BOND).unwrap());

            tree.set_property(bond, TARGETS, PropertyValue::Nodes(vec![a, b]))
                .unwrap();
            assert!(
                tree.set_property(bond, TARGETS, PropertyValue::Nodes(vec![a, a]))
                    .is_err()
            );
            assert!(
                tree.set_property(bond, TARGETS, PropertyValue::Nodes(vec![a, b, a]))
                    .is_err()
            );

            tree.set_property(bond, BOND_TYPE, PropertyValue::Text("ar".into()))
                .unwrap();
            assert_eq!(
                tree.get_property(bond, BOND_TYPE).unwrap(),
                PropertyValue::Text("Aromatic".into())
            );
            assert!(
                tree.set_property(bond, BOND_TYPE, PropertyValue::Text("weird".into()))
                    .is_err()
            );
        }

        #[test]
        fn degenerate_cell_is_rejected() {
            let c = catalog();
            let mut tree = SceneTree::new();
            let universe = tree.create(c.get(UNIVERSE).unwrap());
            assert!(
                tree.set_property(universe, CELL, PropertyValue::Matrix(Matrix3::zeros()))
                    .is_err()
            );
        }

        #[test]
        fn atom_color_prefers_user_color_then_element() {
            let c = catalog();
            let mut tree = SceneTree::new();
            let atom = tree.create(c.get(ATOM).unwrap());
            tree.set_property(atom, NUMBER, PropertyValue::Int(8)).unwrap();
            assert_eq!(atom_color(tree.node(atom).unwrap()), [1.0, 0.1, 0.1, 1.0]);
            tree.set_property(
                atom,
                mixins::USER_COLOR,
                PropertyValue::Color([0.0, 0.0, 1.0, 1.0]),
            )
            .unwrap();
            assert_eq!(atom_color(tree.node(atom).unwrap()), [0.0, 0.0, 1.0, 1.0]);
        }
    }
}
