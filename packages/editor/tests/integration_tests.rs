//! Integration tests for the editor crate

mod common;

use common::{init_tracing, page, paragraphs, place_caret, texts};
use notes_editor::{
    ApplyOptions, Delta, Document, EditorConfig, EditorState, ErrorKind, Node, Operation, Path,
    Position, Selection, SelectionUpdateReason, Transaction, TransactionTime,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_document_lifecycle() -> anyhow::Result<()> {
    init_tracing();
    let mut state = EditorState::new(Document::blank());
    place_caret(&mut state, [0], 0);

    state.insert_text_at_selection("Hello")?;
    state.insert_text_at_selection(", world")?;
    assert_eq!(texts(&state), vec!["Hello, world"]);
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 12)))
    );

    let json = state.document().to_json()?;
    let restored = Document::from_json(&json)?;
    assert_eq!(restored.to_json()?, json);
    Ok(())
}

#[test]
fn test_document_json_shape() -> anyhow::Result<()> {
    let value = json!({
        "type": "page",
        "children": [
            {"type": "heading", "attributes": {"level": 2, "delta": [{"insert": "Title"}]}},
            {"type": "paragraph", "attributes": {"delta": [
                {"insert": "plain "},
                {"insert": "bold", "attributes": {"bold": true}}
            ]}},
            {"type": "divider"}
        ]
    });

    let document = Document::from_json_value(value.clone())?;
    let heading = document.node_at_path(&Path::from([0])).unwrap();
    assert_eq!(heading.attributes.get("level"), Some(&json!(2)));
    assert_eq!(heading.plain_text(), "Title");
    assert!(document.node_at_path(&Path::from([2])).unwrap().delta.is_none());
    assert_eq!(document.to_json_value()?, value);
    Ok(())
}

#[test]
fn test_insert_then_delete_restores_tree() -> anyhow::Result<()> {
    let mut document = paragraphs(&["a", "b"]);
    let before = document.to_json_value()?;
    let nodes = vec![Node::paragraph("x"), Node::paragraph("y")];

    Operation::Insert {
        path: Path::from([1]),
        nodes: nodes.clone(),
    }
    .apply(&mut document)?;
    Operation::Delete {
        path: Path::from([1]),
        nodes,
    }
    .apply(&mut document)?;

    assert_eq!(document.to_json_value()?, before);
    Ok(())
}

#[test]
fn test_operation_log_is_persistable() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["abc"]));
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    state.on_transaction(move |time, transaction, options| {
        if time == TransactionTime::After && !options.in_memory_update {
            sink.borrow_mut()
                .push(serde_json::to_string(transaction).unwrap());
        }
    });

    let mut builder = state.transaction();
    builder.insert_text(&Path::from([0]), 3, "d", None)?;
    let transaction = builder.build();
    state.apply(transaction, ApplyOptions::default())?;

    let mut replica = paragraphs(&["abc"]);
    for entry in log.borrow().iter() {
        let transaction: Transaction = serde_json::from_str(entry)?;
        for op in &transaction.operations {
            op.apply(&mut replica)?;
        }
    }
    assert_eq!(replica.to_json_value()?, state.document().to_json_value()?);
    Ok(())
}

#[test]
fn test_read_only_editor_ignores_edits() -> anyhow::Result<()> {
    let config = EditorConfig::from_json(r#"{"editable": false}"#)?;
    let mut state = EditorState::with_config(paragraphs(&["fixed"]), config);
    place_caret(&mut state, [0], 5);

    state.insert_text_at_selection("!")?;
    state.paste_plain_text("more")?;
    state.delete_backward()?;
    assert_eq!(texts(&state), vec!["fixed"]);

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    state.on_editable_changed(move |editable| sink.borrow_mut().push(editable));
    state.set_editable(true);
    state.set_editable(true);
    state.insert_text_at_selection("!")?;

    assert_eq!(*changes.borrow(), vec![true]);
    assert_eq!(texts(&state), vec!["fixed!"]);
    Ok(())
}

#[test]
fn test_remote_insert_shifts_nested_selection() -> anyhow::Result<()> {
    init_tracing();
    let document = page(vec![
        Node::paragraph("a"),
        Node::paragraph("b"),
        Node::paragraph("c").with_children(vec![Node::paragraph("nested")]),
    ]);
    let mut state = EditorState::new(document);
    place_caret(&mut state, [2, 0], 3);

    let reasons = Rc::new(RefCell::new(Vec::new()));
    let sink = reasons.clone();
    state.on_selection_changed(move |_, reason| sink.borrow_mut().push(reason));

    state.apply_remote(Transaction {
        operations: vec![Operation::Insert {
            path: Path::from([1]),
            nodes: vec![Node::paragraph("from a collaborator")],
        }],
        ..Transaction::default()
    })?;

    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([3, 0], 3)))
    );
    assert_eq!(*reasons.borrow(), vec![SelectionUpdateReason::Remote]);
    assert!(!state.undo_manager().can_undo());
    Ok(())
}

#[test]
fn test_remote_edit_clamps_selection_offset() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["abcdef"]));
    place_caret(&mut state, [0], 6);

    state.apply_remote(Transaction {
        operations: vec![Operation::UpdateText {
            path: Path::from([0]),
            delta: Delta::from_text("ab"),
            old_delta: Delta::from_text("abcdef"),
        }],
        ..Transaction::default()
    })?;

    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 2)))
    );
    Ok(())
}

#[test]
fn test_remote_delete_of_only_node_clears_selection() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["only"]));
    place_caret(&mut state, [0], 2);

    state.apply_remote(Transaction {
        operations: vec![Operation::Delete {
            path: Path::from([0]),
            nodes: vec![Node::paragraph("only")],
        }],
        ..Transaction::default()
    })?;

    assert!(state.document().is_empty());
    assert_eq!(state.selection(), None);
    Ok(())
}

#[test]
fn test_paste_single_line_into_empty_paragraph() -> anyhow::Result<()> {
    let mut state = EditorState::new(Document::blank());
    place_caret(&mut state, [0], 0);

    state.paste_plain_text("hello")?;

    let node = state.document().node_at_path(&Path::from([0])).unwrap();
    assert_eq!(node.node_type, "paragraph");
    assert_eq!(
        serde_json::to_value(&node.delta)?,
        json!([{"insert": "hello"}])
    );
    assert_eq!(state.document().root().children.len(), 1);
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 5)))
    );
    Ok(())
}

#[test]
fn test_paste_two_paragraphs_into_text() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["abcdef"]));
    place_caret(&mut state, [0], 3);

    state.paste_multi_line_nodes(vec![Node::paragraph("foo"), Node::paragraph("bar")])?;

    assert_eq!(texts(&state), vec!["abcfoo", "bardef"]);
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([1], 3)))
    );
    Ok(())
}

#[test]
fn test_paste_links_and_phone_numbers() -> anyhow::Result<()> {
    let mut state = EditorState::new(Document::blank());
    place_caret(&mut state, [0], 0);

    state.paste_plain_text("docs at https://example.com\ncall 555-0100")?;

    let link = state.document().node_at_path(&Path::from([0])).unwrap();
    assert_eq!(
        serde_json::to_value(&link.delta)?,
        json!([
            {"insert": "docs at "},
            {"insert": "https://example.com", "attributes": {"href": "https://example.com"}}
        ])
    );
    let phone = state.document().node_at_path(&Path::from([1])).unwrap();
    assert_eq!(
        serde_json::to_value(&phone.delta)?,
        json!([
            {"insert": "call "},
            {"insert": "555-0100", "attributes": {"href": "tel:5550100"}}
        ])
    );
    Ok(())
}

#[test]
fn test_delete_selection_without_selection() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["untouched"]));
    let before = state.document().to_json_value()?;

    assert_eq!(state.delete_selection_if_needed()?, None);
    assert_eq!(state.document().to_json_value()?, before);
    Ok(())
}

#[test]
fn test_delete_selection_returns_collapsed() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["one", "two", "three"]));
    state.update_selection(
        Some(Selection::new(Position::new([2], 2), Position::new([0], 1))),
        SelectionUpdateReason::UiEvent,
    );

    let caret = state.delete_selection_if_needed()?.unwrap();
    assert!(caret.is_collapsed());
    assert_eq!(caret, Selection::collapsed(Position::new([0], 1)));
    assert_eq!(texts(&state), vec!["oree"]);
    Ok(())
}

#[test]
fn test_builder_errors_surface_kinds() {
    let state = EditorState::new(paragraphs(&["abc"]));
    let mut builder = state.transaction();

    let err = builder
        .insert_node(&Path::from([7]), Node::paragraph("x"))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);

    let err = builder
        .replace_text(&Path::from([0]), 2, 5, "x", None)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::LengthMismatch);
}
