//! Undo/redo sequences driven through EditorState
//!
//! These exercise history coalescing and replay across many transactions, the way
//! an editing session produces them.

mod common;

use common::{init_tracing, paragraphs, place_caret, texts};
use notes_editor::{
    ApplyOptions, Attributes, EditorConfig, EditorState, ManualClock, Node, Path, Position,
    Selection,
};
use serde_json::json;
use std::time::Duration;

fn apply_atomic(state: &mut EditorState, build: impl FnOnce(&mut notes_editor::TransactionBuilder<'_>)) {
    let mut builder = state.transaction();
    build(&mut builder);
    let transaction = builder.build();
    state.apply(transaction, ApplyOptions::atomic()).unwrap();
}

#[test]
fn test_undo_redo_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let mut state = EditorState::new(paragraphs(&["start"]));
    let initial = state.document().to_json_value()?;

    apply_atomic(&mut state, |b| {
        b.insert_text(&Path::from([0]), 5, " here", None).unwrap();
    });
    apply_atomic(&mut state, |b| {
        b.insert_node(&Path::from([1]), Node::paragraph("second")).unwrap();
    });
    apply_atomic(&mut state, |b| {
        let mut heading = Attributes::new();
        heading.insert("level".to_string(), json!(1));
        b.update_node(&Path::from([0]), heading).unwrap();
    });
    apply_atomic(&mut state, |b| {
        b.delete_node(&Path::from([0])).unwrap();
    });
    apply_atomic(&mut state, |b| {
        b.insert_nodes(&Path::from([0]), vec![Node::paragraph("x"), Node::paragraph("y")])
            .unwrap()
            .format_text(&Path::from([2]), 0, 3, {
                let mut bold = Attributes::new();
                bold.insert("bold".to_string(), json!(true));
                bold
            })
            .unwrap();
    });
    let edited = state.document().to_json_value()?;
    assert_eq!(state.undo_manager().undo_len(), 5);

    for _ in 0..5 {
        state.undo()?;
    }
    assert_eq!(state.document().to_json_value()?, initial);
    assert_eq!(state.undo_manager().redo_len(), 5);

    for _ in 0..5 {
        state.redo()?;
    }
    assert_eq!(state.document().to_json_value()?, edited);
    assert_eq!(state.undo_manager().undo_len(), 5);
    assert_eq!(state.undo_manager().redo_len(), 0);
    Ok(())
}

#[test]
fn test_undo_restores_selection() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["abc"]));
    place_caret(&mut state, [0], 3);

    state.insert_text_at_selection("def")?;
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 6)))
    );

    state.undo()?;
    assert_eq!(texts(&state), vec!["abc"]);
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 3)))
    );

    state.redo()?;
    assert_eq!(texts(&state), vec!["abcdef"]);
    assert_eq!(
        state.selection(),
        Some(&Selection::collapsed(Position::new([0], 6)))
    );
    Ok(())
}

#[test]
fn test_typing_burst_coalesces() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut state = EditorState::new(paragraphs(&[""])).with_clock(clock.clone());
    place_caret(&mut state, [0], 0);

    for ch in ["h", "e", "y"] {
        state.insert_text_at_selection(ch)?;
        clock.advance(Duration::from_millis(20));
    }
    assert_eq!(state.undo_manager().undo_len(), 1);

    clock.advance(Duration::from_millis(100));
    state.insert_text_at_selection("!")?;
    assert_eq!(state.undo_manager().undo_len(), 2);

    state.undo()?;
    assert_eq!(texts(&state), vec!["hey"]);
    state.undo()?;
    assert_eq!(texts(&state), vec![""]);
    Ok(())
}

#[test]
fn test_skip_debounce_separates_entries() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut state = EditorState::new(paragraphs(&["a"])).with_clock(clock);

    apply_atomic(&mut state, |b| {
        b.insert_text(&Path::from([0]), 1, "b", None).unwrap();
    });
    apply_atomic(&mut state, |b| {
        b.insert_text(&Path::from([0]), 2, "c", None).unwrap();
    });
    assert_eq!(state.undo_manager().undo_len(), 2);
    Ok(())
}

#[test]
fn test_history_is_bounded() -> anyhow::Result<()> {
    let config = EditorConfig::from_json(r#"{"maxHistoryItemSize": 3}"#)?;
    let mut state = EditorState::with_config(paragraphs(&[""]), config);

    for (index, ch) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        apply_atomic(&mut state, |b| {
            b.insert_text(&Path::from([0]), index, ch, None).unwrap();
        });
    }
    assert_eq!(state.undo_manager().undo_len(), 3);

    for _ in 0..5 {
        state.undo()?;
    }
    // The two oldest edits were evicted
    assert_eq!(texts(&state), vec!["ab"]);
    Ok(())
}

#[test]
fn test_new_branch_clears_redo() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["v0"]));
    for version in 1..=3 {
        apply_atomic(&mut state, |b| {
            b.update_text(&Path::from([0]), notes_editor::Delta::from_text(format!("v{version}")))
                .unwrap();
        });
    }

    state.undo()?;
    state.undo()?;
    assert_eq!(texts(&state), vec!["v1"]);
    assert_eq!(state.undo_manager().redo_len(), 2);

    apply_atomic(&mut state, |b| {
        b.update_text(&Path::from([0]), notes_editor::Delta::from_text("branch"))
            .unwrap();
    });
    assert_eq!(state.undo_manager().redo_len(), 0);
    state.redo()?;
    assert_eq!(texts(&state), vec!["branch"]);
    Ok(())
}

#[test]
fn test_disposed_editor_ignores_history() -> anyhow::Result<()> {
    let mut state = EditorState::new(paragraphs(&["a"]));
    apply_atomic(&mut state, |b| {
        b.insert_text(&Path::from([0]), 1, "b", None).unwrap();
    });
    state.dispose();
    state.undo()?;
    assert_eq!(texts(&state), vec!["ab"]);
    Ok(())
}
