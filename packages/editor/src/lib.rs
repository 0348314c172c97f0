//! # Notes Editor
//!
//! Core document editing engine for a block-based notes editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI: input events, rendering (not here)      │
//! └─────────────────────────────────────────────┘
//!                     ↓ transactions
//! ┌─────────────────────────────────────────────┐
//! │ EditorState                                 │
//! │  - Apply local and remote transactions      │
//! │  - Selection and toggled inline style       │
//! │  - Undo/redo with debounced history         │
//! │  - Typed listener registries                │
//! └─────────────────────────────────────────────┘
//!                     ↓ operations
//! ┌─────────────────────────────────────────────┐
//! │ Document: tree of Nodes, text as Deltas     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Transactions are the only way in**: the UI never mutates the tree directly
//! 2. **Operations are self-contained**: text updates carry full deltas, deletes carry
//!    the removed nodes, so every operation inverts without looking at the document
//! 3. **Remote edits are best effort**: the local selection follows structural edits by
//!    path shifting, not full operational transform
//! 4. **Single owner**: one `EditorState` owns one `Document`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notes_editor::{ApplyOptions, Document, EditorState, Path, Position, Selection};
//!
//! let mut state = EditorState::new(Document::blank());
//!
//! let mut builder = state.transaction();
//! builder
//!     .insert_text(&Path::from([0]), 0, "Hello", None)?
//!     .after_selection(Some(Selection::collapsed(Position::new([0], 5))));
//! let transaction = builder.build();
//! state.apply(transaction, ApplyOptions::default())?;
//!
//! state.undo()?;
//! ```

mod clock;
mod config;
mod delta;
mod document;
mod editor_state;
mod errors;
mod linkify;
mod listeners;
mod node;
mod numbering;
mod operation;
mod paste;
mod path;
mod selection;
mod transaction;
mod undo_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use delta::{compose_attributes, invert_attributes, Attributes, Delta, TextOperation};
pub use document::Document;
pub use editor_state::{ApplyOptions, EditorState};
pub use errors::{EditorError, EditorResult, ErrorKind};
pub use linkify::{linkify_line, plain_text_to_nodes, HREF_ATTRIBUTE};
pub use listeners::{SubscriptionId, TransactionTime};
pub use node::{BlockType, Node, PAGE, PARAGRAPH};
pub use numbering::{numbered_list_marker, NumberFormatter, NUMBER_ATTRIBUTE};
pub use operation::Operation;
pub use path::Path;
pub use selection::{Position, Selection, SelectionUpdateReason};
pub use transaction::{Transaction, TransactionBuilder};
pub use undo_manager::{HistoryItem, UndoManager};
