//! # Workflows Module
//!
//! High-level editing operations built on the [`engine`](crate::engine).
//!
//! ## Architecture
//!
//! - **Edit Actions** ([`edit`]) - Delete, Duplicate, Edit property, Translate,
//!   Move into, and the Undo/Redo/Repeat history commands.
//! - **Built-in Plugin** ([`builtin`]) - Registers the molecular node kinds,
//!   the edit actions, the XYZ filter and the stock cache plugins.

pub mod builtin;
pub mod edit;
