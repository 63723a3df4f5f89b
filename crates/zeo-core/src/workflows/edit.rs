use crate::core::kinds::mixins::TRANSFORMATION;
use crate::core::kinds::molecular::TARGETS;
use crate::core::models::ids::NodeId;
use crate::core::models::value::PropertyValue;
use crate::engine::action::{Action, Step};
use crate::engine::cache::SelectionView;
use crate::engine::error::EngineError;
use crate::engine::history::ActionManager;
use crate::engine::model::Model;
use crate::engine::multiplex::Multiplexed;
use crate::engine::session::EditSession;
use crate::engine::transaction::Transaction;
use nalgebra::{Isometry3, Vector3};
use tracing::{debug, instrument};

/// Referent nodes (bonds) that point at a node no longer in the model.
fn dangling_referents(model: &Model) -> Vec<NodeId> {
    let tree = model.tree();
    model
        .roots()
        .into_iter()
        .flat_map(|r| tree.subtree(r))
        .filter(|&id| {
            let Some(node) = tree.node(id) else {
                return false;
            };
            if !node.kind().capabilities().referent {
                return false;
            }
            node.stored(TARGETS)
                .and_then(PropertyValue::as_nodes)
                .is_some_and(|targets| {
                    targets
                        .iter()
                        .any(|t| !tree.node(*t).is_some_and(|n| n.is_in_model()))
                })
        })
        .collect()
}

/// Removes the selected nodes together with the bonds that pointed at them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Delete;

impl Action for Delete {
    fn name(&self) -> &str {
        "delete"
    }

    fn label(&self) -> String {
        "Delete".to_string()
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        !view.nodes().is_empty() && !view.some_nodes_without_children_fixed()
    }

    #[instrument(skip_all, name = "delete_action")]
    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let targets = tx.view().nodes_without_children();
        delete_nodes(tx, targets)
    }
}

fn delete_nodes(tx: &mut Transaction<'_>, targets: Vec<NodeId>) -> Result<(), EngineError> {
    for node in targets {
        // An earlier removal may already have taken this one out.
        let still_in_model = tx.model().tree().node(node).is_some_and(|n| n.is_in_model());
        if still_in_model {
            tx.remove(node)?;
        }
    }
    let dangling = dangling_referents(tx.model());
    debug!(count = dangling.len(), "Removing dangling bonds");
    for referent in dangling {
        tx.remove(referent)?;
    }
    Ok(())
}

/// Puts copies of the selected nodes on the clipboard, then deletes them.
#[derive(Debug, Default, Clone, Copy)]
pub struct CutNodes;

impl Action for CutNodes {
    fn name(&self) -> &str {
        "cut"
    }

    fn label(&self) -> String {
        "Cut".to_string()
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        !view.nodes().is_empty() && !view.some_nodes_without_children_fixed()
    }

    #[instrument(skip_all, name = "cut_action")]
    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let targets = tx.view().nodes_without_children();
        tx.copy_to_clipboard(&targets)?;
        delete_nodes(tx, targets)
    }
}

/// Puts copies of the selected nodes on the clipboard. Leaves the model and
/// the history untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyNodes;

impl Action for CopyNodes {
    fn name(&self) -> &str {
        "copy"
    }

    fn label(&self) -> String {
        "Copy".to_string()
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        !view.nodes_without_children().is_empty()
    }

    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let targets = tx.view().nodes_without_children();
        let count = tx.copy_to_clipboard(&targets)?;
        debug!(count, "Copied to clipboard");
        Ok(())
    }
}

/// Appends copies of the clipboard nodes to the selected container.
#[derive(Debug, Default, Clone, Copy)]
pub struct PasteNodes;

impl Action for PasteNodes {
    fn name(&self) -> &str {
        "paste"
    }

    fn label(&self) -> String {
        "Paste".to_string()
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        let model = view.model();
        if model.clipboard_is_empty() {
            return false;
        }
        let Some(target) = view.node().and_then(|n| model.tree().node(n)) else {
            return false;
        };
        model
            .clipboard_kinds()
            .iter()
            .any(|kind| target.kind().check_add(kind))
    }

    #[instrument(skip_all, name = "paste_action")]
    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let Some(parent) = tx.view().node() else {
            return Err(EngineError::NotApplicable {
                action: self.label(),
                reason: "select exactly one container".to_string(),
            });
        };
        let copies = tx.paste_clipboard(parent)?;
        for copy in copies {
            tx.add(copy, parent, None)?;
        }
        Ok(())
    }
}

/// Copies the selected nodes and inserts the copies right after the last
/// selected node under the shared parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Duplicate;

impl Action for Duplicate {
    fn name(&self) -> &str {
        "duplicate"
    }

    fn label(&self) -> String {
        "Duplicate".to_string()
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        if view.nodes().is_empty() || view.some_nodes_fixed() {
            return false;
        }
        view.parent()
            .and_then(|p| view.model().tree().node(p))
            .is_some_and(|p| p.kind().capabilities().container)
    }

    #[instrument(skip_all, name = "duplicate_action")]
    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let view = tx.view();
        let originals = view.nodes();
        let (Some(parent), Some(highest)) = (view.parent(), view.highest_index()) else {
            return Err(EngineError::NotApplicable {
                action: self.label(),
                reason: "selection has no shared parent".to_string(),
            });
        };
        let copies = tx.clone_subtrees(&originals)?;
        let mut index = highest;
        for copy in copies {
            index += 1;
            tx.add(copy, parent, Some(index))?;
        }
        Ok(())
    }
}

/// Sets one property to the same value on every selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct EditProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl EditProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Action for EditProperty {
    fn name(&self) -> &str {
        "edit_property"
    }

    fn label(&self) -> String {
        format!("Edit {}", self.name)
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        Multiplexed::read(view.model(), &view.nodes(), &self.name).is_editable()
    }

    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let nodes = tx.view().nodes();
        for node in nodes {
            if tx.model().get_property(node, &self.name)? != self.value {
                tx.set_property(node, &self.name, self.value.clone())?;
            }
        }
        Ok(())
    }
}

/// Shifts every movable selected node by a vector in its parent's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translate {
    pub vector: Vector3<f64>,
}

impl Translate {
    pub fn new(vector: Vector3<f64>) -> Self {
        Self { vector }
    }

    fn movable(view: &SelectionView<'_>) -> Vec<NodeId> {
        let model = view.model();
        view.nodes_without_children()
            .into_iter()
            .filter(|&n| {
                model
                    .tree()
                    .node(n)
                    .is_some_and(|node| node.kind().capabilities().transform)
            })
            .collect()
    }
}

impl Action for Translate {
    fn name(&self) -> &str {
        "translate"
    }

    fn label(&self) -> String {
        "Translate".to_string()
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        !view.some_nodes_without_children_fixed() && !Self::movable(view).is_empty()
    }

    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let shift = Isometry3::translation(self.vector.x, self.vector.y, self.vector.z);
        let movable = Self::movable(&tx.view());
        for node in movable {
            tx.transform(node, shift)?;
        }
        Ok(())
    }
}

/// Moves the selected nodes into `target`, keeping their absolute positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInto {
    pub target: NodeId,
}

impl MoveInto {
    pub fn new(target: NodeId) -> Self {
        Self { target }
    }
}

impl Action for MoveInto {
    fn name(&self) -> &str {
        "move_into"
    }

    fn label(&self) -> String {
        "Move into".to_string()
    }

    fn analyze(&self, view: &SelectionView<'_>) -> bool {
        let model = view.model();
        let tree = model.tree();
        let Some(target) = tree.node(self.target) else {
            return false;
        };
        if !target.is_in_model() || !target.kind().capabilities().container {
            return false;
        }
        let moving = view.nodes_without_children();
        if moving.is_empty() || view.some_nodes_without_children_fixed() {
            return false;
        }
        moving.iter().all(|&n| {
            !tree.is_ancestor_or_self(n, self.target)
                && tree
                    .node(n)
                    .is_some_and(|node| target.kind().check_add(node.kind()))
        })
    }

    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError> {
        let moving = tx.view().nodes_without_children();
        let target_frame = tx.model().tree().absolute_transform(self.target);
        for node in moving {
            let tree = tx.model().tree();
            let transformed = tree
                .node(node)
                .is_some_and(|n| n.kind().capabilities().transform);
            let absolute = tree.absolute_transform(node);
            tx.reparent(node, self.target, None)?;
            if transformed {
                let local = target_frame.inverse() * absolute;
                tx.set_property(node, TRANSFORMATION, PropertyValue::Transform(local))?;
            }
        }
        Ok(())
    }
}

/// The history entries of the Edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
    Undo,
    Redo,
    Repeat,
}

impl HistoryCommand {
    /// Menu label naming the entry the command would act on, e.g.
    /// `Undo 'Delete'`.
    pub fn label(&self, history: &ActionManager) -> String {
        let (verb, target) = match self {
            HistoryCommand::Undo => ("Undo", history.undo_descriptions().next().map(str::to_string)),
            HistoryCommand::Redo => ("Redo", history.redo_descriptions().next().map(str::to_string)),
            HistoryCommand::Repeat => ("Repeat", history.last_action().map(|a| a.label())),
        };
        match target {
            Some(t) => format!("{} '{}'", verb, t),
            None => verb.to_string(),
        }
    }

    pub fn is_available(&self, history: &ActionManager) -> bool {
        match self {
            HistoryCommand::Undo => history.can_undo(),
            HistoryCommand::Redo => history.can_redo(),
            HistoryCommand::Repeat => history.last_action().is_some(),
        }
    }

    pub fn run(&self, session: &mut EditSession) -> Result<Step, EngineError> {
        match self {
            HistoryCommand::Undo => session.undo(),
            HistoryCommand::Redo => session.redo(),
            HistoryCommand::Repeat => session.repeat(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinds::mixins::{LOCKED, NAME};
    use crate::core::kinds::molecular::{ATOM, BOND, FRAME, NOTE, NUMBER};
    use crate::engine::config::SessionConfig;
    use crate::engine::primitive::PrimitiveAction;
    use crate::workflows::builtin::builtin_registry;
    use std::rc::Rc;

    fn session() -> EditSession {
        EditSession::new(builtin_registry().unwrap(), SessionConfig::default()).unwrap()
    }

    fn add(session: &mut EditSession, kind: &str, parent: NodeId) -> NodeId {
        let node = session.create_node(kind).unwrap();
        session
            .execute_primitive(PrimitiveAction::Add {
                node,
                parent,
                index: None,
            })
            .unwrap();
        node
    }

    fn universe(session: &EditSession) -> NodeId {
        session.model().universe().unwrap()
    }

    fn children(session: &EditSession, parent: NodeId) -> Vec<NodeId> {
        session.model().tree().children_of(parent).to_vec()
    }

    fn bond(session: &mut EditSession, a: NodeId, b: NodeId) -> NodeId {
        let root = universe(session);
        let bond = add(session, BOND, root);
        session
            .execute_primitive(PrimitiveAction::SetProperty {
                node: bond,
                name: TARGETS.to_string(),
                value: PropertyValue::Nodes(vec![a, b]),
            })
            .unwrap();
        bond
    }

    mod delete {
        use super::*;

        #[test]
        fn removes_selection_and_undo_restores_it() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let c = add(&mut session, ATOM, root);
            session.set_selection(&[a, c]).unwrap();

            assert!(session.execute("delete").unwrap().is_done());
            assert_eq!(children(&session, root), vec![b]);
            assert!(session.model().selection().is_empty());

            session.undo().unwrap();
            assert_eq!(children(&session, root), vec![a, b, c]);
        }

        #[test]
        fn takes_bonds_of_deleted_atoms_along() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let bond = bond(&mut session, a, b);
            session.select(a).unwrap();

            session.execute("delete").unwrap();
            assert_eq!(children(&session, root), vec![b]);
            session.undo().unwrap();
            assert_eq!(children(&session, root), vec![a, b, bond]);
        }

        #[test]
        fn frame_and_child_selected_removes_frame_once() {
            let mut session = session();
            let root = universe(&session);
            let frame = add(&mut session, FRAME, root);
            let inner = add(&mut session, ATOM, frame);
            session.set_selection(&[frame, inner]).unwrap();
            session.execute("delete").unwrap();
            assert!(children(&session, root).is_empty());
            assert_eq!(children(&session, frame), vec![inner]);
        }

        #[test]
        fn refuses_fixed_and_locked_nodes() {
            let mut session = session();
            let root = universe(&session);
            session.select(root).unwrap();
            assert_eq!(session.execute("delete").unwrap(), Step::Unavailable);

            let frame = add(&mut session, FRAME, root);
            let inner = add(&mut session, ATOM, frame);
            session
                .execute_primitive(PrimitiveAction::SetProperty {
                    node: frame,
                    name: LOCKED.to_string(),
                    value: PropertyValue::Bool(true),
                })
                .unwrap();
            session.set_selection(&[inner]).unwrap();
            assert_eq!(session.execute("delete").unwrap(), Step::Unavailable);
        }
    }

    mod duplicate {
        use super::*;

        #[test]
        fn copies_land_after_highest_selected_index() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let c = add(&mut session, ATOM, root);
            session.set_selection(&[a, b]).unwrap();

            session.execute("duplicate").unwrap();
            let now = children(&session, root);
            assert_eq!(now.len(), 5);
            assert_eq!(&now[..2], &[a, b]);
            assert_eq!(now[4], c);
            assert_eq!(
                session.model().tree().snapshot(now[2]).unwrap().values,
                session.model().tree().snapshot(a).unwrap().values
            );

            session.undo().unwrap();
            assert_eq!(children(&session, root), vec![a, b, c]);
        }

        #[test]
        fn copied_bond_links_the_copied_atoms() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let bond = bond(&mut session, a, b);
            session.set_selection(&[a, b, bond]).unwrap();

            session.execute("duplicate").unwrap();
            let now = children(&session, root);
            assert_eq!(now.len(), 6);
            assert_eq!(
                session.model().get_property(now[5], TARGETS).unwrap(),
                PropertyValue::Nodes(vec![now[3], now[4]])
            );
        }

        #[test]
        fn needs_a_shared_container_parent() {
            let mut session = session();
            let root = universe(&session);
            let frame = add(&mut session, FRAME, root);
            let a = add(&mut session, ATOM, root);
            let inner = add(&mut session, ATOM, frame);
            session.set_selection(&[a, inner]).unwrap();
            assert_eq!(session.execute("duplicate").unwrap(), Step::Unavailable);
        }
    }

    mod properties {
        use super::*;

        #[test]
        fn edit_property_sets_every_node_in_one_entry() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            session.set_selection(&[a, b]).unwrap();
            let before = session.history().undo_count();

            session
                .execute_action(Rc::new(EditProperty::new(NUMBER, PropertyValue::Int(8))))
                .unwrap();
            assert_eq!(
                Multiplexed::read(session.model(), &[a, b], NUMBER),
                Multiplexed::Uniform(PropertyValue::Int(8))
            );
            assert_eq!(session.history().undo_count(), before + 1);

            session.undo().unwrap();
            assert_eq!(
                session.model().get_property(a, NUMBER).unwrap(),
                PropertyValue::Int(6)
            );
        }

        #[test]
        fn insensitive_property_is_unavailable() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let frame = add(&mut session, FRAME, root);
            session.set_selection(&[a, frame]).unwrap();
            let step = session
                .execute_action(Rc::new(EditProperty::new(NUMBER, PropertyValue::Int(8))))
                .unwrap();
            assert_eq!(step, Step::Unavailable);
        }

        #[test]
        fn rejected_value_rolls_back_everything() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            session.set_selection(&[a, b]).unwrap();
            let result =
                session.execute_action(Rc::new(EditProperty::new(NUMBER, PropertyValue::Int(500))));
            assert!(result.is_err());
            assert_eq!(
                session.model().get_property(a, NUMBER).unwrap(),
                PropertyValue::Int(6)
            );
        }

        #[test]
        fn renaming_changes_the_label() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            session.select(a).unwrap();
            session
                .execute_action(Rc::new(EditProperty::new(
                    NAME,
                    PropertyValue::Text("C1".into()),
                )))
                .unwrap();
            assert_eq!(session.model().tree().get(a).unwrap().label(), "C1");
        }
    }

    mod clipboard {
        use super::*;

        fn kind_names(session: &EditSession) -> Vec<String> {
            session
                .model()
                .clipboard_kinds()
                .iter()
                .map(|k| k.name().to_string())
                .collect()
        }

        #[test]
        fn copy_then_paste_into_frame_links_the_pasted_atoms() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let bond = bond(&mut session, a, b);
            let frame = add(&mut session, FRAME, root);
            let entries = session.history().undo_count();

            session.set_selection(&[a, b, bond]).unwrap();
            assert!(session.execute("copy").unwrap().is_done());
            assert_eq!(session.history().undo_count(), entries);
            assert_eq!(children(&session, root).len(), 4);

            session.set_selection(&[frame]).unwrap();
            assert!(session.execute("paste").unwrap().is_done());
            let pasted = children(&session, frame);
            assert_eq!(pasted.len(), 3);
            assert_eq!(
                session.model().get_property(pasted[2], TARGETS).unwrap(),
                PropertyValue::Nodes(vec![pasted[0], pasted[1]])
            );

            session.undo().unwrap();
            assert!(children(&session, frame).is_empty());
            assert!(session.execute("paste").unwrap().is_done());
            assert_eq!(children(&session, frame).len(), 3);
        }

        #[test]
        fn cut_removes_and_undo_brings_back_the_originals() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            session.select(a).unwrap();

            assert!(session.execute("cut").unwrap().is_done());
            assert_eq!(children(&session, root), vec![b]);
            assert_eq!(kind_names(&session), vec![ATOM]);

            session.undo().unwrap();
            assert_eq!(children(&session, root), vec![a, b]);
            assert!(!session.model().clipboard_is_empty());

            session.set_selection(&[root]).unwrap();
            session.execute("paste").unwrap();
            let now = children(&session, root);
            assert_eq!(now.len(), 3);
            assert!(!now[2..].contains(&a));
        }

        #[test]
        fn bond_is_left_behind_without_both_atoms() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);
            let bond = bond(&mut session, a, b);
            session.set_selection(&[a, bond]).unwrap();

            session.execute("copy").unwrap();
            assert_eq!(kind_names(&session), vec![ATOM]);
        }

        #[test]
        fn paste_keeps_only_what_the_container_accepts() {
            let mut session = session();
            let root = universe(&session);
            let folder = session.model().folder().unwrap();
            let atom = add(&mut session, ATOM, root);
            let note = add(&mut session, NOTE, folder);

            session.set_selection(&[root]).unwrap();
            assert_eq!(session.execute("paste").unwrap(), Step::Unavailable);

            session.set_selection(&[atom, note]).unwrap();
            session.execute("copy").unwrap();
            assert_eq!(kind_names(&session), vec![ATOM, NOTE]);

            session.set_selection(&[folder]).unwrap();
            session.execute("paste").unwrap();
            let notes = children(&session, folder);
            assert_eq!(notes.len(), 2);
            assert_eq!(
                session.model().tree().get(notes[1]).unwrap().kind().name(),
                NOTE
            );

            session.set_selection(&[atom]).unwrap();
            assert_eq!(session.execute("paste").unwrap(), Step::Unavailable);
        }
    }

    mod motion {
        use super::*;

        #[test]
        fn translate_is_repeatable_on_a_new_selection() {
            let mut session = session();
            let root = universe(&session);
            let a = add(&mut session, ATOM, root);
            let b = add(&mut session, ATOM, root);

            session.select(a).unwrap();
            session
                .execute_action(Rc::new(Translate::new(Vector3::new(1.0, 0.0, 0.0))))
                .unwrap();
            session.set_selection(&[b]).unwrap();
            assert!(session.repeat().unwrap().is_done());

            let tree = session.model().tree();
            assert_eq!(tree.local_transform(a).translation.vector.x, 1.0);
            assert_eq!(tree.local_transform(b).translation.vector.x, 1.0);
            assert_eq!(
                HistoryCommand::Repeat.label(session.history()),
                "Repeat 'Translate'"
            );
        }

        #[test]
        fn move_into_keeps_absolute_position() {
            let mut session = session();
            let root = universe(&session);
            let frame = add(&mut session, FRAME, root);
            let a = add(&mut session, ATOM, root);
            session.select(frame).unwrap();
            session
                .execute_action(Rc::new(Translate::new(Vector3::new(0.0, 2.0, 0.0))))
                .unwrap();
            session.set_selection(&[a]).unwrap();
            session
                .execute_action(Rc::new(Translate::new(Vector3::new(1.0, 1.0, 0.0))))
                .unwrap();
            let absolute = session.model().tree().absolute_transform(a);

            session.execute_action(Rc::new(MoveInto::new(frame))).unwrap();
            let tree = session.model().tree();
            assert_eq!(tree.parent_of(a), Some(frame));
            assert!((tree.absolute_transform(a).translation.vector - absolute.translation.vector).norm() < 1e-12);
            assert!((tree.local_transform(a).translation.vector.y + 1.0).abs() < 1e-12);

            session.undo().unwrap();
            assert_eq!(session.model().tree().parent_of(a), Some(root));
        }

        #[test]
        fn move_into_keeps_the_selection_through_undo() {
            let mut session = session();
            let root = universe(&session);
            let frame = add(&mut session, FRAME, root);
            let a = add(&mut session, ATOM, root);
            session.set_selection(&[a]).unwrap();

            session.execute_action(Rc::new(MoveInto::new(frame))).unwrap();
            assert_eq!(session.model().selection(), &[a]);
            assert_eq!(session.view().parent(), Some(frame));

            session.undo().unwrap();
            assert_eq!(session.model().selection(), &[a]);
            assert_eq!(session.view().parent(), Some(root));
        }

        #[test]
        fn move_into_own_subtree_is_unavailable() {
            let mut session = session();
            let root = universe(&session);
            let frame = add(&mut session, FRAME, root);
            session.select(frame).unwrap();
            let step = session.execute_action(Rc::new(MoveInto::new(frame))).unwrap();
            assert_eq!(step, Step::Unavailable);
        }
    }

    #[test]
    fn history_labels_name_the_entry() {
        let mut session = session();
        assert_eq!(HistoryCommand::Undo.label(session.history()), "Undo");
        assert!(!HistoryCommand::Redo.is_available(session.history()));

        let root = universe(&session);
        let a = add(&mut session, ATOM, root);
        session.select(a).unwrap();
        session.execute("delete").unwrap();
        assert_eq!(HistoryCommand::Undo.label(session.history()), "Undo 'Delete'");
        HistoryCommand::Undo.run(&mut session).unwrap();
        assert_eq!(HistoryCommand::Redo.label(session.history()), "Redo 'Delete'");
    }
}
