//! # Document Tree
//!
//! A [`Document`] owns a root node (type `page`) and the tree below it. All structural
//! access goes through [`Path`]s, resolved against the tree at the time of the call.
//!
//! ## Lifecycle
//!
//! ```text
//! JSON → Document → Operations (insert/delete/update/update_text) → JSON
//! ```
//!
//! The primitives here are what [`Operation::apply`](crate::Operation::apply) calls;
//! editors go through [`EditorState::apply`](crate::EditorState::apply) instead of
//! calling them directly.

use crate::delta::{compose_attributes, Attributes, Delta};
use crate::errors::{EditorError, EditorResult};
use crate::node::{Node, PAGE};
use crate::path::Path;
use crate::selection::Selection;

/// Editable block document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,

    /// Incremented for every primitive mutation that succeeds
    pub version: u64,
}

impl Document {
    /// Empty page
    pub fn new() -> Self {
        Self::from_root(Node::new(PAGE))
    }

    /// Page holding one empty paragraph, the state of a freshly created note
    pub fn blank() -> Self {
        Self::from_root(Node::new(PAGE).with_children(vec![Node::paragraph("")]))
    }

    pub fn from_root(root: Node) -> Self {
        Self { root, version: 0 }
    }

    pub fn from_json(json: &str) -> EditorResult<Self> {
        let root: Node = serde_json::from_str(json)?;
        Ok(Self::from_root(root))
    }

    pub fn from_json_value(value: serde_json::Value) -> EditorResult<Self> {
        let root: Node = serde_json::from_value(value)?;
        Ok(Self::from_root(root))
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string(&self.root)?)
    }

    pub fn to_json_value(&self) -> EditorResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.root)?)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// True when the page has no content beyond a single empty paragraph
    pub fn is_empty(&self) -> bool {
        match self.root.children.as_slice() {
            [] => true,
            [only] => only.is_empty_paragraph() && only.children.is_empty(),
            _ => false,
        }
    }

    pub fn node_at_path(&self, path: &Path) -> Option<&Node> {
        self.root.descendant(path)
    }

    pub(crate) fn node_at_path_mut(&mut self, path: &Path) -> Option<&mut Node> {
        self.root.descendant_mut(path)
    }

    /// Path of the last top-level node
    pub fn last_path(&self) -> Option<Path> {
        self.root
            .children
            .len()
            .checked_sub(1)
            .map(|index| Path::from([index]))
    }

    /// Insert `nodes` as siblings starting at `path`. Inserting right after the last
    /// child is allowed.
    pub fn insert(&mut self, path: &Path, nodes: Vec<Node>) -> EditorResult<()> {
        let index = path
            .last()
            .ok_or_else(|| EditorError::invalid_path(path, "cannot insert at the root"))?;
        let parent = self
            .node_at_path_mut(&path.parent())
            .ok_or_else(|| EditorError::invalid_path(path, "parent does not exist"))?;
        if index > parent.children.len() {
            return Err(EditorError::invalid_path(
                path,
                format!("index out of range for {} children", parent.children.len()),
            ));
        }

        parent.children.splice(index..index, nodes);
        self.version += 1;
        Ok(())
    }

    /// Remove `count` siblings starting at `path` and return them
    pub fn delete(&mut self, path: &Path, count: usize) -> EditorResult<Vec<Node>> {
        let index = path
            .last()
            .ok_or_else(|| EditorError::invalid_path(path, "cannot delete the root"))?;
        let parent = self
            .node_at_path_mut(&path.parent())
            .ok_or_else(|| EditorError::invalid_path(path, "parent does not exist"))?;
        let end = index
            .checked_add(count)
            .filter(|end| *end <= parent.children.len())
            .ok_or_else(|| {
                EditorError::invalid_path(
                    path,
                    format!(
                        "cannot delete {count} nodes, only {} from this index",
                        parent.children.len().saturating_sub(index)
                    ),
                )
            })?;

        let removed = parent.children.drain(index..end).collect();
        self.version += 1;
        Ok(removed)
    }

    /// Merge `attributes` into the node's attributes by key; `null` removes a key
    pub fn update(&mut self, path: &Path, attributes: &Attributes) -> EditorResult<()> {
        let node = self
            .node_at_path_mut(path)
            .ok_or_else(|| EditorError::invalid_path(path, "node does not exist"))?;
        node.attributes = compose_attributes(&node.attributes, attributes, false);
        self.version += 1;
        Ok(())
    }

    /// Replace the node's text wholesale, returning the previous text
    pub fn update_text(&mut self, path: &Path, delta: Delta) -> EditorResult<Option<Delta>> {
        let node = self
            .node_at_path_mut(path)
            .ok_or_else(|| EditorError::invalid_path(path, "node does not exist"))?;
        let previous = node.delta.replace(delta);
        self.version += 1;
        Ok(previous)
    }

    /// Top-level coverage of a selection: every node whose subtree intersects the
    /// selected path range, minus nodes whose ancestor is already listed.
    pub fn nodes_in_selection(&self, selection: &Selection) -> Vec<&Node> {
        let normalized = selection.normalized();
        let (start, end) = (&normalized.start.path, &normalized.end.path);
        let mut nodes = Vec::new();
        for (index, child) in self.root.children.iter().enumerate() {
            let path = Path::from([index]);
            if &path > end {
                break;
            }
            if &path >= start || path.is_ancestor_of(start) {
                nodes.push(child);
            }
        }
        nodes
    }

    /// Every node path from `start` to `end` inclusive, in document order
    pub fn paths_between(&self, start: &Path, end: &Path) -> Vec<Path> {
        let mut paths = Vec::new();
        collect_paths(&self.root, &Path::root(), start, end, &mut paths);
        paths
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_paths(node: &Node, path: &Path, start: &Path, end: &Path, paths: &mut Vec<Path>) {
    for index in 0..node.children.len() {
        let child_path = path.child(index);
        if &child_path > end {
            return;
        }
        let in_range = &child_path >= start;
        if in_range {
            paths.push(child_path.clone());
        }
        if in_range || child_path.is_ancestor_of(start) {
            collect_paths(&node.children[index], &child_path, start, end, paths);
        }
    }
}
