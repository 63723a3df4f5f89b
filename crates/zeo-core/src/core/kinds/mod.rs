//! # Node Kinds Module
//!
//! Concrete node kinds for molecular scenes and the property groups they are
//! assembled from.
//!
//! - [`mixins`] - Reusable property groups (name/visibility, frame, colour, lock)
//! - [`molecular`] - Universe, Folder, Frame, Atom, Bond, Point and Note kinds
//! - [`elements`] - Periodic table lookups used by atoms and file filters

pub mod elements;
pub mod mixins;
pub mod molecular;
