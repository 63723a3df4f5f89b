//! # Engine Module
//!
//! This module implements the stateful editing machinery of ZeoForge: the
//! document model with its selection and lifecycle events, reversible
//! primitive edits, the undo/redo log and the memoized selection cache.
//!
//! ## Overview
//!
//! Every change to a document goes through a [`primitive::PrimitiveAction`].
//! User-facing [`action::Action`]s group the primitives they apply in a
//! [`transaction::Transaction`], and the [`history::ActionManager`] records
//! each committed transaction as one undo entry. The [`model::Model`] tells
//! its observers about every structural, selection or signalled property
//! change; the [`cache::SelectionCache`] is one such observer and drops its
//! memoized facts whenever the tree moves underneath it.
//!
//! ## Architecture
//!
//! - **Document** ([`model`], [`event`]) - Node arena with universe and folder roots, selection, file lifecycle
//! - **Edits** ([`primitive`], [`transaction`], [`action`]) - Reversible primitives and composite actions
//! - **History** ([`history`]) - Bounded undo stack, redo stack, repeat and save-point tracking
//! - **Selection Facts** ([`cache`], [`multiplex`]) - Memoized queries and multi-node property reads
//! - **Registration** ([`plugins`]) - Node kinds, actions, filters and cache plugins by name
//! - **Session** ([`session`], [`config`]) - The editing session and its tunables
//! - **Error Handling** ([`error`]) - Engine and file error types

pub mod action;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod model;
pub mod multiplex;
pub mod plugins;
pub mod primitive;
pub mod session;
pub mod transaction;
