//! # Document Operations
//!
//! The four primitive, invertible mutations of a [`Document`].
//!
//! ## Operation Semantics
//!
//! ### Insert
//! - Inserts nodes as consecutive siblings at `path`
//! - Inverse is a `Delete` at the same path carrying the same nodes
//!
//! ### Delete
//! - Removes `nodes.len()` siblings at `path`
//! - Carries snapshots of the removed nodes so it can be inverted
//!
//! ### Update
//! - Merges attributes by key (`null` removes a key)
//! - Carries the previous value of every touched key
//!
//! ### UpdateText
//! - Replaces the node's delta wholesale with the already-composed result
//! - Carries the previous delta, so inversion never needs delta arithmetic

use crate::delta::{Attributes, Delta};
use crate::document::Document;
use crate::errors::EditorResult;
use crate::node::Node;
use crate::path::Path;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Insert {
        path: Path,
        nodes: Vec<Node>,
    },

    Delete {
        path: Path,
        nodes: Vec<Node>,
    },

    Update {
        path: Path,
        attributes: Attributes,
        old_attributes: Attributes,
    },

    UpdateText {
        path: Path,
        delta: Delta,
        old_delta: Delta,
    },
}

/// Where a path ends up after an operation has been applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathShift {
    Unchanged,
    Moved(Path),
    /// The path was inside a deleted range
    Removed,
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::Insert { path, .. }
            | Operation::Delete { path, .. }
            | Operation::Update { path, .. }
            | Operation::UpdateText { path, .. } => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Delete { .. } => "delete",
            Operation::Update { .. } => "update",
            Operation::UpdateText { .. } => "update_text",
        }
    }

    pub fn apply(&self, doc: &mut Document) -> EditorResult<()> {
        match self {
            Operation::Insert { path, nodes } => doc.insert(path, nodes.clone()),
            Operation::Delete { path, nodes } => doc.delete(path, nodes.len()).map(|_| ()),
            Operation::Update {
                path, attributes, ..
            } => doc.update(path, attributes),
            Operation::UpdateText { path, delta, .. } => {
                doc.update_text(path, delta.clone()).map(|_| ())
            }
        }
    }

    /// The operation that undoes this one
    pub fn invert(&self) -> Operation {
        match self.clone() {
            Operation::Insert { path, nodes } => Operation::Delete { path, nodes },
            Operation::Delete { path, nodes } => Operation::Insert { path, nodes },
            Operation::Update {
                path,
                attributes,
                old_attributes,
            } => Operation::Update {
                path,
                attributes: old_attributes,
                old_attributes: attributes,
            },
            Operation::UpdateText {
                path,
                delta,
                old_delta,
            } => Operation::UpdateText {
                path,
                delta: old_delta,
                old_delta: delta,
            },
        }
    }

    /// How `path` moves when this operation is applied. Only inserts and deletes among
    /// the siblings of an ancestor of `path` (or of `path` itself) move it.
    pub(crate) fn shift_path(&self, path: &Path) -> PathShift {
        let (op_path, count, inserting) = match self {
            Operation::Insert { path, nodes } => (path, nodes.len(), true),
            Operation::Delete { path, nodes } => (path, nodes.len(), false),
            _ => return PathShift::Unchanged,
        };
        let Some(op_index) = op_path.last() else {
            return PathShift::Unchanged;
        };
        let depth = op_path.len() - 1;
        if path.len() <= depth || !path.starts_with(&op_path[..depth]) {
            return PathShift::Unchanged;
        }

        let index = path[depth];
        if index < op_index {
            PathShift::Unchanged
        } else if inserting {
            PathShift::Moved(path.with_index_at(depth, index + count))
        } else if index < op_index + count {
            PathShift::Removed
        } else {
            PathShift::Moved(path.with_index_at(depth, index - count))
        }
    }
}
