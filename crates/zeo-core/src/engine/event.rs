use crate::core::models::ids::NodeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Notifications emitted by a [`Model`](super::model::Model).
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    FileNew,
    FileOpening { filename: String },
    FileOpened { filename: String },
    FileClosing,
    FileClosed,
    FileSaving { filename: String },
    FileSaved { filename: String },

    SelectionChanged,
    TreeChanged,
    PropertyChanged { node: NodeId, name: String },
}

impl ModelEvent {
    /// Whether the event may change any selection-derived fact.
    pub fn invalidates_selection(&self) -> bool {
        matches!(
            self,
            ModelEvent::SelectionChanged
                | ModelEvent::TreeChanged
                | ModelEvent::PropertyChanged { .. }
                | ModelEvent::FileNew
                | ModelEvent::FileOpened { .. }
                | ModelEvent::FileClosed
        )
    }
}

pub trait ModelObserver {
    fn on_model_event(&self, event: &ModelEvent);
}

/// Fan-out list of observers, notified in registration order.
#[derive(Default, Clone)]
pub struct ObserverList {
    observers: Vec<Rc<dyn ModelObserver>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Rc<dyn ModelObserver>) {
        self.observers.push(observer);
    }

    /// Removes an observer previously added with [`add`](Self::add).
    pub fn remove(&mut self, observer: &Rc<dyn ModelObserver>) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    #[inline]
    pub fn notify(&self, event: &ModelEvent) {
        for observer in &self.observers {
            observer.on_model_event(event);
        }
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.observers.len())
            .finish()
    }
}

/// Observer that records every event. Useful for front ends that poll.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<ModelEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<ModelEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn snapshot(&self) -> Vec<ModelEvent> {
        self.events.borrow().clone()
    }
}

impl ModelObserver for EventLog {
    fn on_model_event(&self, event: &ModelEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
