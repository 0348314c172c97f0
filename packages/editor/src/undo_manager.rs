//! # Undo/Redo History
//!
//! Tracks transaction history and enables undo/redo.
//!
//! ## Design
//!
//! - Consecutive transactions coalesce into one open [`HistoryItem`]
//! - The open item is sealed once no transaction arrives for
//!   `min_history_item_duration`, or immediately when debouncing is skipped
//! - Undo applies the inverse of a sealed item and records it for redo
//! - New edits clear the redo stack
//! - Both stacks are bounded; the oldest entry is evicted first
//!
//! Sealing is driven by a deadline checked against the injected clock on every
//! interaction, so no background timer outlives the editor.

use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::operation::Operation;
use crate::selection::Selection;
use crate::transaction::Transaction;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One undo-stack entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryItem {
    operations: Vec<Operation>,

    pub before_selection: Option<Selection>,

    pub after_selection: Option<Selection>,

    sealed: bool,
}

impl HistoryItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Terminal: a sealed item accepts no more operations
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn add_all(&mut self, operations: impl IntoIterator<Item = Operation>) -> EditorResult<()> {
        if self.sealed {
            return Err(EditorError::HistorySealed);
        }
        self.operations.extend(operations);
        Ok(())
    }

    /// The transaction that reverts this item: inverted operations in reverse order,
    /// restoring the selection from before the item
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            operations: self.operations.iter().rev().map(Operation::invert).collect(),
            before_selection: self.after_selection.clone(),
            after_selection: self.before_selection.clone(),
            ..Transaction::default()
        }
    }
}

/// Undo/redo stacks for one editor
#[derive(Debug)]
pub struct UndoManager {
    /// Most recent last
    undo_stack: VecDeque<HistoryItem>,

    /// Most recently undone last
    redo_stack: VecDeque<HistoryItem>,

    /// Maximum entries per stack (0 = unlimited)
    max_history_item_size: usize,

    min_history_item_duration: Duration,

    /// When the open item gets sealed, if one is open
    seal_deadline: Option<Instant>,
}

impl UndoManager {
    /// Create a manager with default limits (200 entries, 50ms debounce)
    pub fn new() -> Self {
        Self::from_config(&EditorConfig::default())
    }

    pub fn with_limits(max_history_item_size: usize, min_history_item_duration: Duration) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_item_size,
            min_history_item_duration,
            seal_deadline: None,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_limits(config.max_history_item_size, config.min_history_item_duration())
    }

    /// The open history item, starting a new one when the stack is empty or its top
    /// is sealed
    pub fn get_undo_history_item(&mut self) -> &mut HistoryItem {
        if self.undo_stack.back().is_none_or_sealed() {
            push_bounded(&mut self.undo_stack, HistoryItem::new(), self.max_history_item_size);
        }
        let last = self.undo_stack.len() - 1;
        &mut self.undo_stack[last]
    }

    /// Record a locally applied transaction
    pub(crate) fn record(&mut self, transaction: &Transaction, now: Instant, skip_debounce: bool) {
        self.poll(now);

        let item = self.get_undo_history_item();
        let opening = item.is_empty();
        if let Err(err) = item.add_all(transaction.operations.iter().cloned()) {
            tracing::warn!("dropping history for transaction: {}", err);
            return;
        }
        // Undo returns to the selection from before the first coalesced transaction
        if opening {
            item.before_selection = transaction.before_selection.clone();
        }
        item.after_selection = transaction.after_selection.clone();

        if skip_debounce {
            item.seal();
            self.seal_deadline = None;
        } else {
            self.seal_deadline = Some(now + self.min_history_item_duration);
        }
    }

    /// Record a transaction produced by undo, so it can be redone
    pub(crate) fn record_redo(&mut self, transaction: &Transaction) {
        let mut item = HistoryItem {
            operations: transaction.operations.clone(),
            before_selection: transaction.before_selection.clone(),
            after_selection: transaction.after_selection.clone(),
            sealed: false,
        };
        item.seal();
        push_bounded(&mut self.redo_stack, item, self.max_history_item_size);
    }

    /// Seal the open item if its quiet period has elapsed. Returns true if it sealed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.seal_deadline {
            Some(deadline) if now >= deadline => {
                self.flush();
                true
            }
            _ => false,
        }
    }

    /// Seal the open item now
    pub fn flush(&mut self) {
        if let Some(item) = self.undo_stack.back_mut() {
            item.seal();
        }
        self.seal_deadline = None;
    }

    pub(crate) fn pop_undo(&mut self) -> Option<HistoryItem> {
        self.flush();
        self.undo_stack.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<HistoryItem> {
        self.redo_stack.pop_back()
    }

    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Oldest first
    pub fn undo_items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.undo_stack.iter()
    }

    pub fn has_pending_seal(&self) -> bool {
        self.seal_deadline.is_some()
    }

    /// Drop all history and any pending seal
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.seal_deadline = None;
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

trait OpenItem {
    fn is_none_or_sealed(&self) -> bool;
}

impl OpenItem for Option<&HistoryItem> {
    fn is_none_or_sealed(&self) -> bool {
        self.map_or(true, HistoryItem::is_sealed)
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryItem>, item: HistoryItem, max: usize) {
    stack.push_back(item);
    if max > 0 && stack.len() > max {
        stack.pop_front();
    }
}
