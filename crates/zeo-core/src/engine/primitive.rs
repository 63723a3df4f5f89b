use super::model::Model;
use crate::core::kinds::mixins::TRANSFORMATION;
use crate::core::models::ids::NodeId;
use crate::core::models::tree::TreeError;
use crate::core::models::value::{PropertyValue, ValueKind};
use nalgebra::Isometry3;
use tracing::{trace, warn};

/// A requested atomic change to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveAction {
    /// Attach a detached node. `index` is clamped; `None` appends.
    Add {
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    },
    /// Detach a node from its current parent.
    Remove { node: NodeId },
    /// Move a node to another parent (or another position in the same one).
    Reparent {
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    },
    SetProperty {
        node: NodeId,
        name: String,
        value: PropertyValue,
    },
    /// Compose `transformation` onto the node's frame, in parent coordinates.
    Transform {
        node: NodeId,
        transformation: Isometry3<f64>,
    },
    /// Apply in order; undone in reverse order.
    Batch(Vec<PrimitiveAction>),
}

/// A primitive that has been applied, with everything needed to revert and
/// replay it exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedAction {
    Added {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    Removed {
        node: NodeId,
        parent: NodeId,
        index: usize,
    },
    Reparented {
        node: NodeId,
        from: (NodeId, usize),
        to: (NodeId, usize),
    },
    PropertySet {
        node: NodeId,
        name: String,
        previous: PropertyValue,
        current: PropertyValue,
    },
    Transformed {
        node: NodeId,
        previous: Isometry3<f64>,
        current: Isometry3<f64>,
    },
    Batch(Vec<AppliedAction>),
}

fn current_transform(model: &Model, node: NodeId) -> Result<Isometry3<f64>, TreeError> {
    match model.get_property(node, TRANSFORMATION)? {
        PropertyValue::Transform(t) => Ok(t),
        other => Err(TreeError::TypeMismatch {
            property: TRANSFORMATION.to_string(),
            expected: ValueKind::Transform,
            found: other
                .kind()
                .map_or_else(|| "undefined".to_string(), |k| k.to_string()),
        }),
    }
}

impl PrimitiveAction {
    /// Applies the change and records how to revert it.
    ///
    /// # Errors
    ///
    /// Returns the first tree error encountered. A failing batch reverts the
    /// steps it had already applied before returning.
    pub fn apply(self, model: &mut Model) -> Result<AppliedAction, TreeError> {
        trace!(action = %self.describe(), "Applying primitive");
        match self {
            PrimitiveAction::Add {
                node,
                parent,
                index,
            } => {
                let index = model.attach(parent, node, index)?;
                Ok(AppliedAction::Added {
                    node,
                    parent,
                    index,
                })
            }
            PrimitiveAction::Remove { node } => {
                let (parent, index) = model.detach(node)?;
                Ok(AppliedAction::Removed {
                    node,
                    parent,
                    index,
                })
            }
            PrimitiveAction::Reparent {
                node,
                parent,
                index,
            } => {
                let (from, to) = model.move_node(node, parent, index)?;
                Ok(AppliedAction::Reparented { node, from, to })
            }
            PrimitiveAction::SetProperty { node, name, value } => {
                let previous = model.set_property(node, &name, value)?;
                let current = model
                    .tree()
                    .get(node)?
                    .stored(&name)
                    .cloned()
                    .unwrap_or(PropertyValue::Undefined);
                Ok(AppliedAction::PropertySet {
                    node,
                    name,
                    previous,
                    current,
                })
            }
            PrimitiveAction::Transform {
                node,
                transformation,
            } => {
                let previous = current_transform(model, node)?;
                let current = transformation * previous;
                model.set_property(node, TRANSFORMATION, PropertyValue::Transform(current))?;
                Ok(AppliedAction::Transformed {
                    node,
                    previous,
                    current,
                })
            }
            PrimitiveAction::Batch(steps) => {
                let mut applied = Vec::with_capacity(steps.len());
                for step in steps {
                    match step.apply(model) {
                        Ok(done) => applied.push(done),
                        Err(e) => {
                            rollback(model, applied);
                            return Err(e);
                        }
                    }
                }
                Ok(AppliedAction::Batch(applied))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PrimitiveAction::Add { .. } => "Add".to_string(),
            PrimitiveAction::Remove { .. } => "Remove".to_string(),
            PrimitiveAction::Reparent { .. } => "Reparent".to_string(),
            PrimitiveAction::SetProperty { name, .. } => format!("Set {}", name),
            PrimitiveAction::Transform { .. } => "Transform".to_string(),
            PrimitiveAction::Batch(steps) => format!("Batch of {}", steps.len()),
        }
    }
}

/// Reverts already applied steps, newest first, logging (not returning) failures.
pub(crate) fn rollback(model: &mut Model, applied: Vec<AppliedAction>) {
    for step in applied.into_iter().rev() {
        if let Err(e) = step.undo(model) {
            warn!(error = %e, "Rollback step failed");
        }
    }
}

impl AppliedAction {
    /// Restores the state from before the action.
    pub fn undo(&self, model: &mut Model) -> Result<(), TreeError> {
        match self {
            AppliedAction::Added { node, .. } => {
                model.detach(*node)?;
            }
            AppliedAction::Removed {
                node,
                parent,
                index,
            } => {
                model.attach(*parent, *node, Some(*index))?;
            }
            AppliedAction::Reparented { node, from, .. } => {
                model.move_node(*node, from.0, Some(from.1))?;
            }
            AppliedAction::PropertySet {
                node,
                name,
                previous,
                ..
            } => {
                model.set_property(*node, name, previous.clone())?;
            }
            AppliedAction::Transformed { node, previous, .. } => {
                model.set_property(*node, TRANSFORMATION, PropertyValue::Transform(*previous))?;
            }
            AppliedAction::Batch(steps) => {
                for (i, step) in steps.iter().enumerate().rev() {
                    if let Err(e) = step.undo(model) {
                        // Re-apply the steps undone so far so the batch stays whole.
                        for done in &steps[i + 1..] {
                            if let Err(restore) = done.redo(model) {
                                warn!(error = %restore, "Could not restore batch after failed undo");
                            }
                        }
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Replays the action exactly as it was first applied.
    pub fn redo(&self, model: &mut Model) -> Result<(), TreeError> {
        match self {
            AppliedAction::Added {
                node,
                parent,
                index,
            } => {
                model.attach(*parent, *node, Some(*index))?;
            }
            AppliedAction::Removed { node, .. } => {
                model.detach(*node)?;
            }
            AppliedAction::Reparented { node, to, .. } => {
                model.move_node(*node, to.0, Some(to.1))?;
            }
            AppliedAction::PropertySet {
                node,
                name,
                current,
                ..
            } => {
                model.set_property(*node, name, current.clone())?;
            }
            AppliedAction::Transformed { node, current, .. } => {
                model.set_property(*node, TRANSFORMATION, PropertyValue::Transform(*current))?;
            }
            AppliedAction::Batch(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    if let Err(e) = step.redo(model) {
                        for done in steps[..i].iter().rev() {
                            if let Err(restore) = done.undo(model) {
                                warn!(error = %restore, "Could not restore batch after failed redo");
                            }
                        }
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of leaf steps.
    pub fn len(&self) -> usize {
        match self {
            AppliedAction::Batch(steps) => steps.iter().map(AppliedAction::len).sum(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every node the record refers to.
    pub(crate) fn touched(&self, out: &mut Vec<NodeId>) {
        match self {
            AppliedAction::Added { node, parent, .. } | AppliedAction::Removed { node, parent, .. } => {
                out.push(*node);
                out.push(*parent);
            }
            AppliedAction::Reparented { node, from, to } => {
                out.extend([*node, from.0, to.0]);
            }
            AppliedAction::PropertySet { node, .. } | AppliedAction::Transformed { node, .. } => {
                out.push(*node);
            }
            AppliedAction::Batch(steps) => steps.iter().for_each(|s| s.touched(out)),
        }
    }

    /// Nodes that are detached in the current state and that only this record
    /// can bring back: what it added once it has been undone, what it removed
    /// while it is applied.
    pub(crate) fn detached_by(&self, undone: bool, out: &mut Vec<NodeId>) {
        match self {
            AppliedAction::Added { node, .. } if undone => out.push(*node),
            AppliedAction::Removed { node, .. } if !undone => out.push(*node),
            AppliedAction::Batch(steps) => steps.iter().for_each(|s| s.detached_by(undone, out)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinds::molecular::{ATOM, FRAME, NUMBER};
    use crate::core::models::tree::NodeSnapshot;
    use crate::engine::event::{EventLog, ModelEvent};
    use crate::engine::model::blank_scene;
    use crate::engine::plugins::PluginRegistry;
    use crate::workflows::builtin::builtin_registry;
    use nalgebra::Vector3;
    use std::rc::Rc;

    struct Fixture {
        registry: PluginRegistry,
        model: Model,
        root: NodeId,
    }

    fn fixture() -> Fixture {
        let registry = builtin_registry().unwrap();
        let mut model = Model::new();
        model
            .file_new(blank_scene(registry.kinds()).unwrap())
            .unwrap();
        let root = model.universe().unwrap();
        Fixture {
            registry,
            model,
            root,
        }
    }

    impl Fixture {
        fn node(&mut self, kind: &str) -> NodeId {
            self.model
                .create_node(self.registry.kinds().get(kind).unwrap())
        }

        fn snapshot(&self) -> NodeSnapshot {
            self.model.tree().snapshot(self.root).unwrap()
        }
    }

    mod reversibility {
        use super::*;

        #[test]
        fn add_add_remove_then_undo_in_sequence() {
            let mut f = fixture();
            let a = f.node(ATOM);
            let b = f.node(ATOM);
            let empty = f.snapshot();

            let add_a = PrimitiveAction::Add {
                node: a,
                parent: f.root,
                index: Some(0),
            }
            .apply(&mut f.model)
            .unwrap();
            let after_a = f.snapshot();
            let add_b = PrimitiveAction::Add {
                node: b,
                parent: f.root,
                index: Some(1),
            }
            .apply(&mut f.model)
            .unwrap();
            let after_b = f.snapshot();
            let remove_a = PrimitiveAction::Remove { node: a }
                .apply(&mut f.model)
                .unwrap();
            assert_eq!(f.model.tree().children_of(f.root), &[b]);

            remove_a.undo(&mut f.model).unwrap();
            assert_eq!(f.model.tree().children_of(f.root), &[a, b]);
            assert_eq!(f.snapshot(), after_b);
            add_b.undo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), after_a);
            add_a.undo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), empty);
            assert!(f.model.tree().children_of(f.root).is_empty());
        }

        #[test]
        fn remove_restores_middle_position() {
            let mut f = fixture();
            let ids: Vec<NodeId> = (0..3).map(|_| f.node(ATOM)).collect();
            for &id in &ids {
                f.model.attach(f.root, id, None).unwrap();
            }
            let before = f.snapshot();
            let removed = PrimitiveAction::Remove { node: ids[1] }
                .apply(&mut f.model)
                .unwrap();
            assert_eq!(
                removed,
                AppliedAction::Removed {
                    node: ids[1],
                    parent: f.root,
                    index: 1
                }
            );
            removed.undo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), before);
        }

        #[test]
        fn reparent_round_trips_and_redo_replays() {
            let mut f = fixture();
            let frame = f.node(FRAME);
            let atom = f.node(ATOM);
            f.model.attach(f.root, atom, None).unwrap();
            f.model.attach(f.root, frame, None).unwrap();
            let before = f.snapshot();

            let moved = PrimitiveAction::Reparent {
                node: atom,
                parent: frame,
                index: None,
            }
            .apply(&mut f.model)
            .unwrap();
            let after = f.snapshot();
            assert_eq!(f.model.tree().parent_of(atom), Some(frame));

            moved.undo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), before);
            moved.redo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), after);
        }

        #[test]
        fn failed_reparent_leaves_node_in_place() {
            let mut f = fixture();
            let a = f.node(ATOM);
            let b = f.node(ATOM);
            f.model.attach(f.root, a, None).unwrap();
            f.model.attach(f.root, b, None).unwrap();
            let before = f.snapshot();
            let err = PrimitiveAction::Reparent {
                node: a,
                parent: b,
                index: None,
            }
            .apply(&mut f.model)
            .unwrap_err();
            assert!(matches!(err, TreeError::Rejected { .. }));
            assert_eq!(f.snapshot(), before);
        }

        #[test]
        fn set_property_and_transform_capture_previous_values() {
            let mut f = fixture();
            let atom = f.node(ATOM);
            f.model.attach(f.root, atom, None).unwrap();
            let before = f.snapshot();

            let set = PrimitiveAction::SetProperty {
                node: atom,
                name: NUMBER.to_string(),
                value: PropertyValue::Int(8),
            }
            .apply(&mut f.model)
            .unwrap();
            let moved = PrimitiveAction::Transform {
                node: atom,
                transformation: Isometry3::translation(1.0, 2.0, 3.0),
            }
            .apply(&mut f.model)
            .unwrap();
            let shifted = f.model.tree().absolute_transform(atom).translation.vector;
            assert_eq!(shifted, Vector3::new(1.0, 2.0, 3.0));

            moved.undo(&mut f.model).unwrap();
            set.undo(&mut f.model).unwrap();
            assert_eq!(f.snapshot(), before);
        }

        #[test]
        fn transform_requires_a_frame() {
            let mut f = fixture();
            let err = PrimitiveAction::Transform {
                node: f.root,
                transformation: Isometry3::identity(),
            }
            .apply(&mut f.model)
            .unwrap_err();
            assert!(matches!(err, TreeError::UnknownProperty { .. }));
        }
    }

    mod batches {
        use super::*;

        #[test]
        fn batch_undo_runs_in_reverse_order() {
            let mut f = fixture();
            let n = f.node(ATOM);
            let log = Rc::new(EventLog::new());
            f.model.add_observer(log.clone());

            let applied = PrimitiveAction::Batch(vec![
                PrimitiveAction::Add {
                    node: n,
                    parent: f.root,
                    index: None,
                },
                PrimitiveAction::SetProperty {
                    node: n,
                    name: NUMBER.to_string(),
                    value: PropertyValue::Int(5),
                },
            ])
            .apply(&mut f.model)
            .unwrap();
            assert_eq!(
                log.take(),
                vec![
                    ModelEvent::TreeChanged,
                    ModelEvent::PropertyChanged {
                        node: n,
                        name: NUMBER.to_string()
                    }
                ]
            );

            applied.undo(&mut f.model).unwrap();
            let events = log.take();
            // The property is reverted first, then the node is removed.
            assert_eq!(
                events,
                vec![
                    ModelEvent::PropertyChanged {
                        node: n,
                        name: NUMBER.to_string()
                    },
                    ModelEvent::TreeChanged
                ]
            );
            let forward_order = vec![
                ModelEvent::TreeChanged,
                ModelEvent::PropertyChanged {
                    node: n,
                    name: NUMBER.to_string(),
                },
            ];
            assert_ne!(events, forward_order);
            assert!(f.model.tree().children_of(f.root).is_empty());
            assert_eq!(
                f.model.get_property(n, NUMBER).unwrap(),
                PropertyValue::Int(6)
            );
        }

        #[test]
        fn failing_batch_rolls_back_applied_steps() {
            let mut f = fixture();
            let a = f.node(ATOM);
            let before = f.snapshot();
            let err = PrimitiveAction::Batch(vec![
                PrimitiveAction::Add {
                    node: a,
                    parent: f.root,
                    index: None,
                },
                PrimitiveAction::SetProperty {
                    node: a,
                    name: NUMBER.to_string(),
                    value: PropertyValue::Int(500),
                },
            ])
            .apply(&mut f.model)
            .unwrap_err();
            assert!(matches!(err, TreeError::Validation { .. }));
            assert_eq!(f.snapshot(), before);
            assert!(!f.model.tree().node(a).unwrap().is_in_model());
        }

        #[test]
        fn nested_batch_len_counts_leaves() {
            let mut f = fixture();
            let a = f.node(ATOM);
            let b = f.node(ATOM);
            let applied = PrimitiveAction::Batch(vec![
                PrimitiveAction::Add {
                    node: a,
                    parent: f.root,
                    index: None,
                },
                PrimitiveAction::Batch(vec![PrimitiveAction::Add {
                    node: b,
                    parent: f.root,
                    index: None,
                }]),
            ])
            .apply(&mut f.model)
            .unwrap();
            assert_eq!(applied.len(), 2);
        }
    }
}
