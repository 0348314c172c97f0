//! # Editor State
//!
//! Owns one [`Document`] and coordinates every change to it.
//!
//! UI code never mutates the document directly: it builds a [`Transaction`] with
//! [`EditorState::transaction`] and hands it to [`EditorState::apply`], which mutates the
//! tree, moves the selection, notifies subscribers and feeds the [`UndoManager`].
//!
//! ## Local vs remote
//!
//! Local transactions notify transaction listeners before and after the mutation and
//! are recorded for undo. Remote transactions (`is_remote`) come from collaborators:
//! they are applied silently, never recorded, and the local selection is carried along
//! so it keeps pointing at the same content.

use crate::clock::{Clock, SystemClock};
use crate::config::EditorConfig;
use crate::delta::{compose_attributes, utf16_len, utf16_width_before, Attributes};
use crate::document::Document;
use crate::errors::{EditorError, EditorResult};
use crate::listeners::{
    EditableListener, Listeners, SelectionListener, SubscriptionId, ToggledStyleListener,
    TransactionListener, TransactionTime,
};
use crate::operation::{Operation, PathShift};
use crate::path::Path;
use crate::selection::{Position, Selection, SelectionUpdateReason};
use crate::transaction::{Transaction, TransactionBuilder};
use crate::undo_manager::UndoManager;
use serde_json::Value;

/// How [`EditorState::apply`] treats a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Record into the undo stack
    pub record_undo: bool,

    /// Record into the redo stack; set when replaying an undone item
    pub record_redo: bool,

    /// Passed through to transaction listeners: the change is not meant to be persisted
    pub in_memory_update: bool,

    /// Authored by a collaborator rather than this editor
    pub is_remote: bool,

    /// Move the selection to the transaction's `after_selection`
    pub with_update_selection: bool,

    /// Seal the history item right away instead of waiting for the quiet period
    pub skip_history_debounce: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            record_undo: true,
            record_redo: false,
            in_memory_update: false,
            is_remote: false,
            with_update_selection: true,
            skip_history_debounce: false,
        }
    }
}

impl ApplyOptions {
    pub fn remote() -> Self {
        Self {
            record_undo: false,
            is_remote: true,
            ..Self::default()
        }
    }

    /// Local change that must not merge with the next edit in history
    pub fn atomic() -> Self {
        Self {
            skip_history_debounce: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryOrigin {
    Edit,
    Undo,
    Redo,
}

pub struct EditorState {
    document: Document,

    selection: Option<Selection>,

    selection_reason: SelectionUpdateReason,

    /// Attributes the next typed character takes, overriding the preceding run
    toggled_style: Attributes,

    editable: bool,

    disposed: bool,

    config: EditorConfig,

    undo_manager: UndoManager,

    clock: Box<dyn Clock>,

    listeners: Listeners,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    pub fn with_config(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            selection: None,
            selection_reason: SelectionUpdateReason::default(),
            toggled_style: Attributes::new(),
            editable: config.editable,
            disposed: false,
            undo_manager: UndoManager::from_config(&config),
            config,
            clock: Box::new(SystemClock),
            listeners: Listeners::new(),
        }
    }

    /// Replace the time source used for history debouncing
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selection_reason(&self) -> SelectionUpdateReason {
        self.selection_reason
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo_manager
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Accepting transactions: editable and not disposed
    pub(crate) fn is_active(&self) -> bool {
        self.editable && !self.disposed
    }

    /// Start a transaction against the current document, remembering the current
    /// selection as its `before_selection`
    pub fn transaction(&self) -> TransactionBuilder<'_> {
        let mut builder = TransactionBuilder::new(&self.document);
        builder.before_selection(self.selection.clone());
        builder
    }

    /// Apply a transaction. A no-op while the editor is read-only or disposed.
    ///
    /// Local operations apply in order; the first failing operation aborts the rest and
    /// its error is returned, leaving earlier operations applied and nothing recorded.
    /// Remote failures are logged and the remainder of the transaction dropped.
    pub fn apply(&mut self, transaction: Transaction, options: ApplyOptions) -> EditorResult<()> {
        self.apply_with_origin(transaction, options, HistoryOrigin::Edit)
    }

    pub fn apply_remote(&mut self, transaction: Transaction) -> EditorResult<()> {
        self.apply(transaction, ApplyOptions::remote())
    }

    fn apply_with_origin(
        &mut self,
        transaction: Transaction,
        options: ApplyOptions,
        origin: HistoryOrigin,
    ) -> EditorResult<()> {
        if !self.is_active() {
            tracing::debug!(
                editable = self.editable,
                disposed = self.disposed,
                "ignoring transaction"
            );
            return Ok(());
        }

        tracing::debug!(
            operations = transaction.operations.len(),
            remote = options.is_remote,
            "applying transaction"
        );

        if options.is_remote {
            self.apply_remote_operations(&transaction);
            return Ok(());
        }

        self.notify_transaction(TransactionTime::Before, &transaction, &options);
        for op in &transaction.operations {
            tracing::trace!(op = op.name(), path = %op.path(), "apply operation");
            op.apply(&mut self.document)?;
        }
        self.notify_transaction(TransactionTime::After, &transaction, &options);

        self.record_history(&transaction, &options, origin);

        if options.with_update_selection {
            self.update_selection(transaction.after_selection.clone(), transaction.reason);
        }
        Ok(())
    }

    fn record_history(&mut self, transaction: &Transaction, options: &ApplyOptions, origin: HistoryOrigin) {
        if transaction.is_empty() {
            return;
        }
        if options.record_undo {
            let skip_debounce = options.skip_history_debounce || origin == HistoryOrigin::Redo;
            self.undo_manager.record(transaction, self.clock.now(), skip_debounce);
            if origin == HistoryOrigin::Edit {
                self.undo_manager.clear_redo();
            }
        }
        if options.record_redo {
            self.undo_manager.record_redo(transaction);
        }
    }

    fn apply_remote_operations(&mut self, transaction: &Transaction) {
        let mut selection = self.selection.clone();

        for (index, op) in transaction.operations.iter().enumerate() {
            if let Err(err) = op.apply(&mut self.document) {
                tracing::warn!(
                    error = %err,
                    dropped = transaction.operations.len() - index,
                    "dropping remote operations"
                );
                break;
            }
            selection = selection.and_then(|selection| {
                let start = self.carry_position(selection.start, op)?;
                let end = self.carry_position(selection.end, op)?;
                Some(Selection::new(start, end))
            });
        }

        let selection = selection.and_then(|selection| {
            let start = self.clamp_position(selection.start)?;
            let end = self.clamp_position(selection.end)?;
            Some(Selection::new(start, end))
        });
        if selection != self.selection {
            self.update_selection(selection, SelectionUpdateReason::Remote);
        }
    }

    /// Where `position` lands once `op` has been applied to the document
    fn carry_position(&self, position: Position, op: &Operation) -> Option<Position> {
        match op.shift_path(&position.path) {
            PathShift::Unchanged => Some(position),
            PathShift::Moved(path) => Some(position.with_path(path)),
            PathShift::Removed => {
                let deleted = op.path();
                if self.document.node_at_path(deleted).is_some() {
                    return Some(Position::new(deleted.clone(), 0));
                }
                if let Some(previous) = deleted.previous() {
                    let length = self.document.node_at_path(&previous)?.text_len();
                    return Some(Position::new(previous, length));
                }
                let parent = deleted.parent();
                if parent.is_root() {
                    return None;
                }
                let length = self.document.node_at_path(&parent)?.text_len();
                Some(Position::new(parent, length))
            }
        }
    }

    fn clamp_position(&self, position: Position) -> Option<Position> {
        let length = self.document.node_at_path(&position.path)?.text_len();
        let offset = position.offset.min(length);
        Some(position.with_offset(offset))
    }

    /// Set the selection. Listeners hear about actual changes only; any change clears
    /// the toggled style.
    pub fn update_selection(&mut self, selection: Option<Selection>, reason: SelectionUpdateReason) {
        if self.disposed {
            return;
        }
        self.selection_reason = reason;
        if self.selection == selection {
            return;
        }
        self.selection = selection;

        if !self.toggled_style.is_empty() {
            self.toggled_style.clear();
            self.notify_toggled_style();
        }

        let current = self.selection.as_ref();
        for listener in self.listeners.selection.iter_mut() {
            listener(current, reason);
        }
    }

    pub fn toggled_style(&self) -> &Attributes {
        &self.toggled_style
    }

    /// Set one key of the toggled style. `null` turns the attribute off for the next
    /// typed character.
    pub fn update_toggled_style(&mut self, key: impl Into<String>, value: Value) {
        if self.disposed {
            return;
        }
        self.toggled_style.insert(key.into(), value);
        self.notify_toggled_style();
    }

    pub fn set_editable(&mut self, editable: bool) {
        if self.disposed || self.editable == editable {
            return;
        }
        self.editable = editable;
        for listener in self.listeners.editable.iter_mut() {
            listener(editable);
        }
    }

    /// Tear down: drops every subscriber and the pending history seal. Later calls to
    /// `apply`, `undo` and `redo` are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!(listeners = self.listeners.count(), "disposing editor state");
        self.disposed = true;
        self.listeners.clear();
        self.undo_manager.clear();
    }

    pub fn on_transaction(
        &mut self,
        listener: impl FnMut(TransactionTime, &Transaction, &ApplyOptions) + 'static,
    ) -> SubscriptionId {
        let listener: Box<TransactionListener> = Box::new(listener);
        self.listeners.add_transaction(listener)
    }

    pub fn on_selection_changed(
        &mut self,
        listener: impl FnMut(Option<&Selection>, SelectionUpdateReason) + 'static,
    ) -> SubscriptionId {
        let listener: Box<SelectionListener> = Box::new(listener);
        self.listeners.add_selection(listener)
    }

    pub fn on_editable_changed(&mut self, listener: impl FnMut(bool) + 'static) -> SubscriptionId {
        let listener: Box<EditableListener> = Box::new(listener);
        self.listeners.add_editable(listener)
    }

    pub fn on_toggled_style_changed(
        &mut self,
        listener: impl FnMut(&Attributes) + 'static,
    ) -> SubscriptionId {
        let listener: Box<ToggledStyleListener> = Box::new(listener);
        self.listeners.add_toggled_style(listener)
    }

    /// Remove a subscriber registered through any `on_*` method
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    fn notify_transaction(&mut self, time: TransactionTime, transaction: &Transaction, options: &ApplyOptions) {
        for listener in self.listeners.transaction.iter_mut() {
            listener(time, transaction, options);
        }
    }

    fn notify_toggled_style(&mut self) {
        let style = &self.toggled_style;
        for listener in self.listeners.toggled_style.iter_mut() {
            listener(style);
        }
    }

    /// Revert the most recent history item. Empty history is a no-op.
    pub fn undo(&mut self) -> EditorResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(item) = self.undo_manager.pop_undo() else {
            return Ok(());
        };
        tracing::debug!(operations = item.operations().len(), "undo");

        let options = ApplyOptions {
            record_undo: false,
            record_redo: true,
            ..ApplyOptions::default()
        };
        self.apply_with_origin(item.to_transaction(), options, HistoryOrigin::Undo)
    }

    /// Re-apply the most recently undone item. Empty history is a no-op.
    pub fn redo(&mut self) -> EditorResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(item) = self.undo_manager.pop_redo() else {
            return Ok(());
        };
        tracing::debug!(operations = item.operations().len(), "redo");

        self.apply_with_origin(item.to_transaction(), ApplyOptions::default(), HistoryOrigin::Redo)
    }

    /// Seal the open history item if its quiet period has passed on the editor clock.
    /// Hosts call this from their event loop; recording new history polls implicitly.
    pub fn poll_history(&mut self) -> bool {
        let now = self.clock.now();
        self.undo_manager.poll(now)
    }

    /// Type `text` at the caret, replacing a range selection first. The new run takes
    /// the preceding character's formatting overlaid with the toggled style.
    pub fn insert_text_at_selection(&mut self, text: &str) -> EditorResult<()> {
        if !self.is_active() || text.is_empty() {
            return Ok(());
        }
        let Some(selection) = self.delete_selection_if_needed()? else {
            return Ok(());
        };
        let position = selection.start;

        let preceding = self
            .document
            .node_at_path(&position.path)
            .and_then(|node| node.delta.as_ref())
            .map(|delta| delta.attributes_at(position.offset))
            .unwrap_or_default();
        let attributes = compose_attributes(&preceding, &self.toggled_style, false);
        let caret = position.with_offset(position.offset + utf16_len(text));

        let mut builder = self.transaction();
        builder
            .insert_text(&position.path, position.offset, text, Some(attributes))?
            .after_selection(Some(Selection::collapsed(caret)));
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }

    /// Backspace: removes a range selection, the character before the caret, or at the
    /// start of a node merges it into the previous text node.
    pub fn delete_backward(&mut self) -> EditorResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if !selection.is_collapsed() {
            return self.delete_selection(&selection);
        }

        let position = selection.start;
        let mut builder = self.transaction();
        if position.offset > 0 {
            let width = self
                .document
                .node_at_path(&position.path)
                .map(|node| utf16_width_before(&node.plain_text(), position.offset))
                .unwrap_or(1)
                .max(1);
            let from = position.offset.saturating_sub(width);
            builder
                .delete_text(&position.path, from, position.offset - from)?
                .after_selection(Some(Selection::collapsed(position.with_offset(from))));
        } else {
            let Some(previous) = previous_text_path(&self.document, &position.path) else {
                return Ok(());
            };
            let node = self
                .document
                .node_at_path(&position.path)
                .ok_or_else(|| EditorError::invalid_path(&position.path, "node does not exist"))?;
            let Some(previous_len) = self
                .document
                .node_at_path(&previous)
                .and_then(|node| node.delta.as_ref())
                .map(|delta| delta.len())
            else {
                return Ok(());
            };

            // Children of the merged node take its place among its siblings
            builder
                .merge_text(&previous, &position.path, None, 0)?
                .insert_nodes(&position.path.next(), node.children.clone())?
                .delete_node(&position.path)?
                .after_selection(Some(Selection::collapsed(Position::new(
                    previous,
                    previous_len,
                ))));
        }
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }

    /// Apply `attributes` to the selected text. On a caret the attributes become the
    /// toggled style instead.
    pub fn format_selection(&mut self, attributes: Attributes) -> EditorResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if selection.is_collapsed() {
            for (key, value) in attributes {
                self.toggled_style.insert(key, value);
            }
            self.notify_toggled_style();
            return Ok(());
        }

        let normalized = selection.normalized();
        let (start, end) = (&normalized.start, &normalized.end);
        let paths = self.document.paths_between(&start.path, &end.path);

        let mut builder = self.transaction();
        for path in &paths {
            let length = match self.document.node_at_path(path) {
                Some(node) if node.delta.is_some() => node.text_len(),
                _ => continue,
            };
            let from = if path == &start.path { start.offset } else { 0 };
            let to = if path == &end.path { end.offset } else { length };
            if to > from {
                builder.format_text(path, from, to - from, attributes.clone())?;
            }
        }
        builder.after_selection(Some(selection));
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }
}

/// The text node preceding `path` in document order
fn previous_text_path(document: &Document, path: &Path) -> Option<Path> {
    let candidate = match path.previous() {
        Some(previous) => {
            let node = document.node_at_path(&previous)?;
            let mut indices = previous.into_vec();
            indices.extend(node.deepest_last_child_path());
            Path::new(indices)
        }
        None => {
            let parent = path.parent();
            if parent.is_root() {
                return None;
            }
            parent
        }
    };
    document
        .node_at_path(&candidate)
        .filter(|node| node.delta.is_some())
        .map(|_| candidate)
}
