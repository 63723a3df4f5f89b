//! Undo/redo log of executed edits.
//!
//! [`ActionManager`] keeps one [`HistoryEntry`] per logical edit. An entry is
//! the committed [`AppliedAction`] of one action run (usually a batch), so a
//! single undo reverts everything that action changed.

use super::action::{Action, Step};
use super::cache::SelectionCache;
use super::error::EngineError;
use super::model::Model;
use super::primitive::{AppliedAction, PrimitiveAction};
use super::transaction::Transaction;
use crate::core::models::ids::NodeId;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// One recorded edit.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub description: String,
    pub applied: AppliedAction,
}

/// Bounded undo stack, redo stack and the last repeatable action.
pub struct ActionManager {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_undo: usize,
    last_action: Option<Rc<dyn Action>>,
    /// Distance to the saved state: `Some(0)` when saved, positive when undos
    /// lead back to it, negative when redos do, `None` once unreachable.
    save_distance: Option<i64>,
}

impl ActionManager {
    /// Creates an empty manager. A depth of zero is treated as one.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            last_action: None,
            save_distance: Some(0),
        }
    }

    /// Runs `action` against the current selection and records it.
    ///
    /// # Return
    ///
    /// [`Step::Unavailable`] when the action does not apply to the selection,
    /// otherwise [`Step::Done`] with the action label. If the action fails,
    /// everything it applied is rolled back and nothing is recorded.
    #[instrument(skip_all, name = "execute", fields(action = action.name()))]
    pub fn execute(
        &mut self,
        action: Rc<dyn Action>,
        model: &mut Model,
        cache: &SelectionCache,
    ) -> Result<Step, EngineError> {
        let applicable = {
            let view = super::cache::SelectionView::new(model, cache);
            action.analyze(&view)
        };
        if !applicable {
            debug!("Action does not apply to the current selection");
            return Ok(Step::Unavailable);
        }

        let mut tx = Transaction::new(model, cache);
        if let Err(e) = action.run(&mut tx) {
            warn!(error = %e, "Action failed, rolling back");
            tx.rollback();
            return Err(e);
        }
        let label = action.label();
        if let Some(applied) = tx.commit() {
            self.push(
                HistoryEntry {
                    description: label.clone(),
                    applied,
                },
                model,
            );
        }
        if action.repeatable() {
            self.last_action = Some(action);
        }
        info!(action = %label, "Executed");
        Ok(Step::Done(label))
    }

    /// Applies a single primitive and records it as its own entry.
    pub fn execute_primitive(
        &mut self,
        action: PrimitiveAction,
        model: &mut Model,
    ) -> Result<Step, EngineError> {
        let description = action.describe();
        let applied = action.apply(model)?;
        self.push(
            HistoryEntry {
                description: description.clone(),
                applied,
            },
            model,
        );
        Ok(Step::Done(description))
    }

    fn push(&mut self, entry: HistoryEntry, model: &mut Model) {
        let abandoned: Vec<HistoryEntry> = self.redo_stack.drain(..).collect();
        if let Some(d) = self.save_distance {
            self.save_distance = if d < 0 { None } else { Some(d + 1) };
        }
        self.undo_stack.push_back(entry);
        self.release(model, &abandoned, true);
        self.trim(model);
    }

    fn trim(&mut self, model: &mut Model) {
        let mut expired = Vec::new();
        while self.undo_stack.len() > self.max_undo {
            if let Some(entry) = self.undo_stack.pop_front() {
                expired.push(entry);
            }
            if let Some(d) = self.save_distance {
                if d > self.undo_stack.len() as i64 {
                    self.save_distance = None;
                }
            }
        }
        self.release(model, &expired, false);
    }

    /// Frees the detached nodes that only the dropped entries could have
    /// re-attached. `undone` tells whether the entries came off the redo stack.
    fn release(&self, model: &mut Model, dropped: &[HistoryEntry], undone: bool) {
        let mut candidates = Vec::new();
        for entry in dropped {
            entry.applied.detached_by(undone, &mut candidates);
        }
        if candidates.is_empty() {
            return;
        }
        let mut referenced = Vec::new();
        for entry in self.undo_stack.iter().chain(self.redo_stack.iter()) {
            entry.applied.touched(&mut referenced);
        }
        let referenced: HashSet<NodeId> = referenced.into_iter().collect();

        let mut freed = 0;
        for id in candidates {
            let loose = model
                .tree()
                .node(id)
                .is_some_and(|n| n.parent().is_none() && !n.is_in_model());
            if !loose || model.tree().subtree(id).iter().any(|n| referenced.contains(n)) {
                continue;
            }
            match model.discard(id) {
                Ok(()) => freed += 1,
                Err(e) => warn!(node = ?id, error = %e, "Could not free a dropped history node"),
            }
        }
        if freed > 0 {
            debug!(freed, "Freed nodes of dropped history entries");
        }
    }

    /// Reverts the most recent entry.
    ///
    /// A failing inverse leaves the entry on the undo stack.
    pub fn undo(&mut self, model: &mut Model) -> Result<Step, EngineError> {
        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(Step::Unavailable);
        };
        if let Err(e) = entry.applied.undo(model) {
            self.undo_stack.push_back(entry);
            return Err(e.into());
        }
        debug!(entry = %entry.description, "Undone");
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        if let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(Step::Done(description))
    }

    /// Re-applies the most recently undone entry.
    pub fn redo(&mut self, model: &mut Model) -> Result<Step, EngineError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(Step::Unavailable);
        };
        if let Err(e) = entry.applied.redo(model) {
            self.redo_stack.push(entry);
            return Err(e.into());
        }
        debug!(entry = %entry.description, "Redone");
        let description = entry.description.clone();
        self.undo_stack.push_back(entry);
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.trim(model);
        Ok(Step::Done(description))
    }

    /// Runs the last repeatable action again on the current selection.
    pub fn repeat(&mut self, model: &mut Model, cache: &SelectionCache) -> Result<Step, EngineError> {
        match self.last_action.clone() {
            Some(action) => self.execute(action, model, cache),
            None => Ok(Step::Unavailable),
        }
    }

    /// Forgets both stacks and the last action.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_action = None;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }

    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|e| e.description.as_str())
    }

    /// Redo descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|e| e.description.as_str())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    pub fn last_action(&self) -> Option<&Rc<dyn Action>> {
        self.last_action.as_ref()
    }
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionManager")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("last_action", &self.last_action.as_ref().map(|a| a.name().to_string()))
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
