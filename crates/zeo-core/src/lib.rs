//! # ZeoForge Core Library
//!
//! An editing core for molecular scene graphs: typed, observable node
//! properties, reversible edits with undo/redo, and a memoized selection
//! cache that stays consistent while the tree changes underneath it.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data: property tables, node kinds,
//!   the node arena (`SceneTree`) and the load/dump filters.
//!
//! - **[`engine`]: The Logic Core.** The stateful document (`Model`), primitive
//!   actions, transactions, the `ActionManager` undo log, the `SelectionCache`,
//!   the plugin registry and the `EditSession` that ties them together.
//!
//! - **[`workflows`]: The Public API.** Ready-to-use editing actions (delete,
//!   duplicate, edit property, translate, move into) and the built-in plugin
//!   that registers them together with the molecular kinds and the XYZ filter.

pub mod core;
pub mod engine;
pub mod workflows;
