//! Shared fixtures for integration tests

#![allow(dead_code)]

use notes_editor::{Document, EditorState, Node, Path, Position, Selection, SelectionUpdateReason, PAGE};
use tracing_subscriber::EnvFilter;

/// Route editor logs to the test harness; `RUST_LOG=notes_editor=trace` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn page(children: Vec<Node>) -> Document {
    Document::from_root(Node::new(PAGE).with_children(children))
}

pub fn paragraphs(texts: &[&str]) -> Document {
    page(texts.iter().map(|text| Node::paragraph(*text)).collect())
}

pub fn texts(state: &EditorState) -> Vec<String> {
    state
        .document()
        .root()
        .children
        .iter()
        .map(Node::plain_text)
        .collect()
}

pub fn place_caret(state: &mut EditorState, path: impl Into<Path>, offset: usize) {
    state.update_selection(
        Some(Selection::collapsed(Position::new(path, offset))),
        SelectionUpdateReason::UiEvent,
    );
}
