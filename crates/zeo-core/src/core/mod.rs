//! # Core Module
//!
//! This module provides the stateless building blocks of ZeoForge: the scene
//! data model, the concrete node kinds, and file filters.
//!
//! ## Architecture
//!
//! - **Scene Representation** ([`models`]) - Property tables, nodes and the node arena
//! - **Node Kinds** ([`kinds`]) - Molecular node kinds and shared property groups
//! - **File I/O** ([`io`]) - Load/dump filter contracts, compression, the XYZ format
//!
//! Nothing in this layer knows about selections, undo or observers; those live
//! in the [`engine`](crate::engine).

pub mod io;
pub mod kinds;
pub mod models;
