//! Typed subscriber registries, one per notification concern.

use crate::delta::Attributes;
use crate::editor_state::ApplyOptions;
use crate::selection::{Selection, SelectionUpdateReason};
use crate::transaction::Transaction;

/// Handle returned by every `on_*` registration; pass it to
/// [`EditorState::unsubscribe`](crate::EditorState::unsubscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Whether a transaction notification precedes or follows the document mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionTime {
    Before,
    After,
}

pub type TransactionListener = dyn FnMut(TransactionTime, &Transaction, &ApplyOptions);
pub type SelectionListener = dyn FnMut(Option<&Selection>, SelectionUpdateReason);
pub type EditableListener = dyn FnMut(bool);
pub type ToggledStyleListener = dyn FnMut(&Attributes);

pub(crate) struct Subscribers<F: ?Sized> {
    entries: Vec<(SubscriptionId, Box<F>)>,
}

impl<F: ?Sized> Subscribers<F> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add(&mut self, id: SubscriptionId, listener: Box<F>) {
        self.entries.push((id, listener));
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Listeners in registration order
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.entries.iter_mut().map(|(_, listener)| listener)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) struct Listeners {
    next_id: u64,
    pub(crate) transaction: Subscribers<TransactionListener>,
    pub(crate) selection: Subscribers<SelectionListener>,
    pub(crate) editable: Subscribers<EditableListener>,
    pub(crate) toggled_style: Subscribers<ToggledStyleListener>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            transaction: Subscribers::new(),
            selection: Subscribers::new(),
            editable: Subscribers::new(),
            toggled_style: Subscribers::new(),
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub(crate) fn add_transaction(&mut self, listener: Box<TransactionListener>) -> SubscriptionId {
        let id = self.next_id();
        self.transaction.add(id, listener);
        id
    }

    pub(crate) fn add_selection(&mut self, listener: Box<SelectionListener>) -> SubscriptionId {
        let id = self.next_id();
        self.selection.add(id, listener);
        id
    }

    pub(crate) fn add_editable(&mut self, listener: Box<EditableListener>) -> SubscriptionId {
        let id = self.next_id();
        self.editable.add(id, listener);
        id
    }

    pub(crate) fn add_toggled_style(
        &mut self,
        listener: Box<ToggledStyleListener>,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.toggled_style.add(id, listener);
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        self.transaction.remove(id)
            || self.selection.remove(id)
            || self.editable.remove(id)
            || self.toggled_style.remove(id)
    }

    pub(crate) fn count(&self) -> usize {
        self.transaction.len() + self.selection.len() + self.editable.len() + self.toggled_style.len()
    }

    pub(crate) fn clear(&mut self) {
        self.transaction = Subscribers::new();
        self.selection = Subscribers::new();
        self.editable = Subscribers::new();
        self.toggled_style = Subscribers::new();
    }
}
