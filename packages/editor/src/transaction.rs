//! # Transactions
//!
//! A [`Transaction`] is an ordered batch of [`Operation`]s plus the selection before and
//! after it: the unit of atomic mutation and of undo.
//!
//! Transactions are assembled with a [`TransactionBuilder`], which translates editing
//! intents (insert a node, replace a run of text, format a range) into primitive
//! operations. Building never mutates the document. Each operation's path is expressed
//! against the document as it will be after the operations before it, so the builder
//! reads node content through a staged copy once the transaction is non-empty.

use crate::delta::{Attributes, Delta, TextOperation};
use crate::document::Document;
use crate::errors::{EditorError, EditorResult};
use crate::node::Node;
use crate::operation::Operation;
use crate::path::Path;
use crate::selection::{Selection, SelectionUpdateReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub operations: Vec<Operation>,

    #[serde(default)]
    pub before_selection: Option<Selection>,

    #[serde(default)]
    pub after_selection: Option<Selection>,

    /// Reason reported to selection listeners when `after_selection` is applied
    #[serde(default)]
    pub reason: SelectionUpdateReason,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Append an operation. A text update directly following another text update of
    /// the same node is folded into it.
    pub fn add(&mut self, op: Operation) {
        if let (
            Some(Operation::UpdateText {
                path: last_path,
                delta: last_delta,
                ..
            }),
            Operation::UpdateText { path, delta, .. },
        ) = (self.operations.last_mut(), &op)
        {
            if last_path == path {
                *last_delta = delta.clone();
                return;
            }
        }
        self.operations.push(op);
    }
}

/// Accumulates operations for one transaction, validating each against the document
/// as it will be when that operation applies.
pub struct TransactionBuilder<'a> {
    document: &'a Document,

    /// Copy of `document` with the operations so far applied; made on first need
    staged: Option<Document>,

    transaction: Transaction,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            staged: None,
            transaction: Transaction::new(),
        }
    }

    /// Document state the next operation will see
    fn view(&mut self) -> EditorResult<&Document> {
        if self.transaction.is_empty() {
            return Ok(self.document);
        }
        if self.staged.is_none() {
            let mut staged = self.document.clone();
            for op in &self.transaction.operations {
                op.apply(&mut staged)?;
            }
            self.staged = Some(staged);
        }
        Ok(self.staged.as_ref().unwrap_or(self.document))
    }

    fn node(&mut self, path: &Path) -> EditorResult<Node> {
        self.view()?
            .node_at_path(path)
            .cloned()
            .ok_or_else(|| EditorError::invalid_path(path, "node does not exist"))
    }

    fn text(&mut self, path: &Path) -> EditorResult<Delta> {
        self.node(path)?.delta.ok_or_else(|| {
            EditorError::InvalidArgument(format!("node at {path} has no text"))
        })
    }

    fn push(&mut self, op: Operation) -> EditorResult<()> {
        if let Some(staged) = self.staged.as_mut() {
            op.apply(staged)?;
        }
        tracing::trace!(op = op.name(), path = %op.path(), "staged operation");
        self.transaction.add(op);
        Ok(())
    }

    pub fn insert_node(&mut self, path: &Path, node: Node) -> EditorResult<&mut Self> {
        self.insert_nodes(path, vec![node])
    }

    pub fn insert_nodes(&mut self, path: &Path, nodes: Vec<Node>) -> EditorResult<&mut Self> {
        if nodes.is_empty() {
            return Ok(self);
        }
        let index = path
            .last()
            .ok_or_else(|| EditorError::invalid_path(path, "cannot insert at the root"))?;
        let sibling_count = self
            .view()?
            .node_at_path(&path.parent())
            .map(|parent| parent.children.len())
            .ok_or_else(|| EditorError::invalid_path(path, "parent does not exist"))?;
        if index > sibling_count {
            return Err(EditorError::invalid_path(path, "index out of range"));
        }

        self.push(Operation::Insert {
            path: path.clone(),
            nodes,
        })?;
        Ok(self)
    }

    pub fn delete_node(&mut self, path: &Path) -> EditorResult<&mut Self> {
        self.delete_nodes_at_path(path, 1)
    }

    pub fn delete_nodes_at_path(&mut self, path: &Path, count: usize) -> EditorResult<&mut Self> {
        if count == 0 {
            return Ok(self);
        }
        let index = path
            .last()
            .ok_or_else(|| EditorError::invalid_path(path, "cannot delete the root"))?;
        let parent = self.node(&path.parent())?;
        let nodes = index
            .checked_add(count)
            .and_then(|end| parent.children.get(index..end))
            .ok_or_else(|| EditorError::invalid_path(path, format!("fewer than {count} nodes")))?
            .to_vec();

        self.push(Operation::Delete {
            path: path.clone(),
            nodes,
        })?;
        Ok(self)
    }

    /// Delete several nodes given by their current paths. Paths inside another listed
    /// node are covered by that node's deletion.
    pub fn delete_nodes(&mut self, paths: &[Path]) -> EditorResult<&mut Self> {
        let mut sorted: Vec<&Path> = paths
            .iter()
            .filter(|path| !paths.iter().any(|other| other.is_ancestor_of(path)))
            .collect();
        sorted.sort();
        sorted.dedup();

        // Last first, so earlier paths stay valid
        for path in sorted.into_iter().rev() {
            self.delete_node(path)?;
        }
        Ok(self)
    }

    /// Merge `attributes` into the node's attributes, remembering the previous values.
    /// Skipped entirely when nothing would change.
    pub fn update_node(&mut self, path: &Path, attributes: Attributes) -> EditorResult<&mut Self> {
        let node = self.node(path)?;
        let old_attributes: Attributes = attributes
            .keys()
            .map(|key| {
                let old = node.attributes.get(key).cloned().unwrap_or(Value::Null);
                (key.clone(), old)
            })
            .collect();
        if old_attributes == attributes {
            return Ok(self);
        }

        self.push(Operation::Update {
            path: path.clone(),
            attributes,
            old_attributes,
        })?;
        Ok(self)
    }

    /// Replace the node's text with `delta`
    pub fn update_text(&mut self, path: &Path, delta: Delta) -> EditorResult<&mut Self> {
        let old_delta = self.text(path)?;
        if old_delta == delta {
            return Ok(self);
        }
        self.push(Operation::UpdateText {
            path: path.clone(),
            delta,
            old_delta,
        })?;
        Ok(self)
    }

    /// Compose `change` onto the node's text and record the full result
    fn compose_text(&mut self, path: &Path, change: Delta) -> EditorResult<&mut Self> {
        let old_delta = self.text(path)?;
        let delta = old_delta.compose(&change)?;
        self.update_text(path, delta)
    }

    /// Replace `length` characters at `index` with `text`. Without explicit
    /// attributes the new run takes the formatting of the text it replaces.
    pub fn replace_text(
        &mut self,
        path: &Path,
        index: usize,
        length: usize,
        text: &str,
        attributes: Option<Attributes>,
    ) -> EditorResult<&mut Self> {
        let attributes = match attributes {
            Some(attributes) => attributes,
            None => {
                let current = self.text(path)?;
                let anchor = if length > 0 { index + 1 } else { index };
                current.attributes_at(anchor)
            }
        };
        let change = Delta::new()
            .retain(index)
            .delete(length)
            .insert_with(text, attributes);
        self.compose_text(path, change)
    }

    /// Insert `text` at `index`, continuing the preceding run's formatting unless
    /// attributes are given
    pub fn insert_text(
        &mut self,
        path: &Path,
        index: usize,
        text: &str,
        attributes: Option<Attributes>,
    ) -> EditorResult<&mut Self> {
        self.replace_text(path, index, 0, text, attributes)
    }

    pub fn delete_text(&mut self, path: &Path, index: usize, length: usize) -> EditorResult<&mut Self> {
        self.compose_text(path, Delta::new().retain(index).delete(length))
    }

    /// Apply an attribute patch over `[index, index + length)`, keeping the text
    pub fn format_text(
        &mut self,
        path: &Path,
        index: usize,
        length: usize,
        attributes: Attributes,
    ) -> EditorResult<&mut Self> {
        self.compose_text(path, Delta::new().retain(index).retain_with(length, attributes))
    }

    /// Splice the inserts of `inserted` into the node's text at `index`
    pub fn insert_delta(&mut self, path: &Path, index: usize, inserted: &Delta) -> EditorResult<&mut Self> {
        let mut change = Delta::new().retain(index);
        for op in inserted.ops() {
            if let TextOperation::Insert { .. } = op {
                change.push(op.clone());
            }
        }
        self.compose_text(path, change)
    }

    /// Set `left`'s text to its first `left_offset` characters followed by `right`'s
    /// text from `right_offset`. `right` itself is left alone.
    pub fn merge_text(
        &mut self,
        left: &Path,
        right: &Path,
        left_offset: Option<usize>,
        right_offset: usize,
    ) -> EditorResult<&mut Self> {
        let left_delta = self.text(left)?;
        let right_delta = self.text(right)?;
        let keep = left_offset.unwrap_or_else(|| left_delta.len());
        let merged = left_delta.slice(0, keep).concat(&right_delta.slice_from(right_offset));
        self.update_text(left, merged)
    }

    pub fn before_selection(&mut self, selection: Option<Selection>) -> &mut Self {
        self.transaction.before_selection = selection;
        self
    }

    pub fn after_selection(&mut self, selection: Option<Selection>) -> &mut Self {
        self.transaction.after_selection = selection;
        self
    }

    pub fn reason(&mut self, reason: SelectionUpdateReason) -> &mut Self {
        self.transaction.reason = reason;
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.transaction.operations
    }

    pub fn build(self) -> Transaction {
        self.transaction
    }
}
