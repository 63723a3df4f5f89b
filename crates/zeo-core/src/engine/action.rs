use super::cache::SelectionView;
use super::error::EngineError;
use super::transaction::Transaction;

/// A user-facing editing command.
///
/// An action declares whether it applies to the current selection
/// ([`analyze`](Self::analyze)) and performs its edit through a
/// [`Transaction`], so that everything it changes becomes one undo entry.
pub trait Action {
    /// Registry identifier, e.g. `"delete"`.
    fn name(&self) -> &str;

    /// Label shown in menus and in undo descriptions.
    fn label(&self) -> String {
        self.name().to_string()
    }

    /// Whether "Repeat" may re-run this action on a later selection.
    fn repeatable(&self) -> bool {
        false
    }

    /// Pure applicability check against the current selection.
    fn analyze(&self, view: &SelectionView<'_>) -> bool;

    fn run(&self, tx: &mut Transaction<'_>) -> Result<(), EngineError>;
}

/// Outcome of execute, undo, redo or repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Something happened; carries the description of the affected entry.
    Done(String),
    /// Nothing to do: empty stack, no repeatable action, or the action does
    /// not apply to the current selection.
    Unavailable,
}

impl Step {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }
}
