//! # Core Models Module
//!
//! This module contains the scene-graph data structures every other part of
//! ZeoForge builds on: typed property values, per-kind property tables, nodes,
//! and the arena that owns them.
//!
//! ## Overview
//!
//! A node kind ([`kind::NodeKind`]) declares a fixed list of properties
//! ([`property::Property`]), each with a value type, a default factory and
//! optional read/write hooks. Nodes ([`node::Node`]) store one value per
//! declared property and live in a [`tree::SceneTree`], which is the only place
//! where parent/child links change.
//!
//! ## Key Components
//!
//! - [`value`] - Property values and their declared types
//! - [`property`] - Property table entries with hooks and flags
//! - [`kind`] - Node kinds, capabilities and the kind catalog
//! - [`node`] - Individual nodes
//! - [`tree`] - The node arena with structural and property operations
//! - [`ids`] - Node handles
//!
//! ## Usage
//!
//! ```ignore
//! use zeoforge::core::models::tree::SceneTree;
//!
//! let mut tree = SceneTree::new();
//! let frame = tree.create(catalog.get("Frame")?);
//! let atom = tree.create(catalog.get("Atom")?);
//! tree.attach_child(frame, atom, None)?;
//! tree.set_property(atom, "number", PropertyValue::Int(8))?;
//! ```

pub mod ids;
pub mod kind;
pub mod node;
pub mod property;
pub mod tree;
pub mod value;
