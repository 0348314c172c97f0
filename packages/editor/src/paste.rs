//! Range deletion and paste.
//!
//! Pasting always happens at a caret: a range selection is deleted first. A single
//! pasted block is spliced into the block under the caret; several blocks split it,
//! the text before the caret joining the first pasted block and the text after it
//! joining the last.

use crate::editor_state::{ApplyOptions, EditorState};
use crate::errors::{EditorError, EditorResult};
use crate::linkify::plain_text_to_nodes;
use crate::node::{BlockType, Node};
use crate::path::Path;
use crate::selection::{Position, Selection};

impl EditorState {
    /// Delete the selected range, if any. Returns the caret left behind, or `None`
    /// when there is no selection at all.
    pub fn delete_selection_if_needed(&mut self) -> EditorResult<Option<Selection>> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(None);
        };
        if selection.is_collapsed() {
            return Ok(Some(selection));
        }
        self.delete_selection(&selection)?;
        Ok(Some(selection.normalized().collapse(true)))
    }

    /// Delete the content covered by `selection`.
    ///
    /// Across nodes, the start node keeps its text before the range and gains the end
    /// node's text after it. Nodes between are removed, and the end node's children move
    /// under the start node. Ancestors of the end node survive with their text cleared.
    pub fn delete_selection(&mut self, selection: &Selection) -> EditorResult<()> {
        if !self.is_active() || selection.is_collapsed() {
            return Ok(());
        }
        let normalized = selection.normalized();
        let (start, end) = (&normalized.start, &normalized.end);
        let caret = Selection::collapsed(start.clone());

        let mut builder = self.transaction();
        if normalized.is_single() {
            builder.delete_text(&start.path, start.offset, end.offset - start.offset)?;
        } else {
            let document = self.document();
            let start_node = document
                .node_at_path(&start.path)
                .ok_or_else(|| EditorError::invalid_path(&start.path, "selection start does not exist"))?;
            let end_node = document
                .node_at_path(&end.path)
                .ok_or_else(|| EditorError::invalid_path(&end.path, "selection end does not exist"))?;
            let keep_end = start_node.delta.is_none() && end_node.delta.is_some();

            match (&start_node.delta, &end_node.delta) {
                (Some(_), Some(_)) => {
                    builder.merge_text(&start.path, &end.path, Some(start.offset), end.offset)?;
                }
                (Some(delta), None) => {
                    let length = delta.len().saturating_sub(start.offset);
                    builder.delete_text(&start.path, start.offset, length)?;
                }
                (None, Some(_)) => {
                    builder.delete_text(&end.path, 0, end.offset)?;
                }
                (None, None) => {}
            }

            let between = document.paths_between(&start.path, &end.path);
            // The start node keeps its merged text even when it contains the end
            for ancestor in between
                .iter()
                .filter(|path| *path != &start.path && path.is_ancestor_of(&end.path))
            {
                if document
                    .node_at_path(ancestor)
                    .is_some_and(|node| node.text_len() > 0)
                {
                    builder.update_text(ancestor, Default::default())?;
                }
            }

            let doomed: Vec<Path> = between
                .into_iter()
                .filter(|path| path != &start.path && !path.is_ancestor_of(&end.path))
                .filter(|path| !(keep_end && path == &end.path))
                .collect();
            builder.delete_nodes(&doomed)?;

            if !keep_end && !end_node.children.is_empty() {
                builder.insert_nodes(&start.path.child(0), end_node.children.clone())?;
            }
        }
        builder.after_selection(Some(caret));
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }

    /// Paste one block at the caret.
    ///
    /// An empty paragraph is replaced by the pasted node, which adopts its children.
    /// Otherwise the pasted text is spliced in at the caret; a list block also adopts
    /// the pasted node's children.
    pub fn paste_single_line_node(&mut self, node: Node) -> EditorResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(selection) = self.delete_selection_if_needed()? else {
            return Ok(());
        };
        let Position { path, offset } = selection.start;
        let target = self
            .document()
            .node_at_path(&path)
            .cloned()
            .ok_or_else(|| EditorError::invalid_path(&path, "paste target does not exist"))?;
        let inserted_len = node.text_len();

        let mut builder = self.transaction();
        let caret = if target.is_empty_paragraph() {
            let mut children = node.children.clone();
            children.extend(target.children);
            builder
                .insert_node(&path, node.with_children(children))?
                .delete_node(&path.next())?;
            Position::new(path, inserted_len)
        } else if target.delta.is_none() {
            let next = path.next();
            builder.insert_node(&next, node)?;
            Position::new(next, inserted_len)
        } else {
            let delta = node.delta.clone().unwrap_or_default();
            builder.insert_delta(&path, offset, &delta)?;
            if target.block_type().is_list() && !node.children.is_empty() {
                builder.insert_nodes(&path.child(0), node.children)?;
            }
            Position::new(path, offset + inserted_len)
        };
        builder.after_selection(Some(Selection::collapsed(caret)));
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }

    /// Paste several blocks at the caret, splitting the block under it.
    ///
    /// The caret ends in the deepest last descendant of the last pasted block, after
    /// its pasted text.
    pub fn paste_multi_line_nodes(&mut self, mut nodes: Vec<Node>) -> EditorResult<()> {
        if nodes.len() <= 1 {
            return Err(EditorError::InvalidArgument(format!(
                "multi-line paste needs at least two nodes, got {}",
                nodes.len()
            )));
        }
        if !self.is_active() {
            return Ok(());
        }
        let Some(selection) = self.delete_selection_if_needed()? else {
            return Ok(());
        };
        let Position { path, offset } = selection.start;
        let target = self
            .document()
            .node_at_path(&path)
            .cloned()
            .ok_or_else(|| EditorError::invalid_path(&path, "paste target does not exist"))?;
        let count = nodes.len();

        let (mut caret_path, caret_offset) = {
            let last = &nodes[count - 1];
            let relative = last.deepest_last_child_path();
            let offset = last.descendant(&relative).map_or(0, Node::text_len);
            (relative, offset)
        };

        let mut builder = self.transaction();
        let Some(target_delta) = target.delta.clone() else {
            let next = path.next();
            let mut indices = next.next_n(count - 1).into_vec();
            indices.append(&mut caret_path);
            builder.insert_nodes(&next, nodes)?.after_selection(Some(Selection::collapsed(
                Position::new(Path::new(indices), caret_offset),
            )));
            let transaction = builder.build();
            return self.apply(transaction, ApplyOptions::default());
        };

        let prefix = target_delta.slice(0, offset);
        let suffix = target_delta.slice_from(offset);

        let first = &mut nodes[0];
        let first_delta = first.delta.take().unwrap_or_default();
        first.delta = Some(prefix.concat(&first_delta));
        if target_delta.is_empty() && target.block_type() != BlockType::Paragraph {
            first.node_type = target.node_type.clone();
            first.attributes = target.attributes.clone();
        }

        let last = &mut nodes[count - 1];
        let last_delta = last.delta.take().unwrap_or_default();
        last.delta = Some(last_delta.concat(&suffix));
        last.children.extend(target.children);

        let mut indices = path.next_n(count - 1).into_vec();
        indices.append(&mut caret_path);
        builder
            .insert_nodes(&path, nodes)?
            .delete_node(&path.next_n(count))?
            .after_selection(Some(Selection::collapsed(Position::new(
                Path::new(indices),
                caret_offset,
            ))));
        let transaction = builder.build();
        self.apply(transaction, ApplyOptions::default())
    }

    /// Paste plain text: one block per line, links and phone numbers carrying `href`
    pub fn paste_plain_text(&mut self, text: &str) -> EditorResult<()> {
        let mut nodes = plain_text_to_nodes(text, &self.config().default_block_type);
        match nodes.len() {
            0 => Ok(()),
            1 => match nodes.pop() {
                Some(node) => self.paste_single_line_node(node),
                None => Ok(()),
            },
            _ => self.paste_multi_line_nodes(nodes),
        }
    }
}
