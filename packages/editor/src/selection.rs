//! # Positions and Selections
//!
//! A [`Position`] is a node path plus a text offset inside that node. A [`Selection`]
//! is a pair of positions; it may be stored backward to remember drag direction, and
//! [`Selection::normalized`] orders it.

use crate::path::Path;
use serde::{Deserialize, Serialize};

/// Caret location. Orders by path, then offset, which is document order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub path: Path,
    #[serde(default)]
    pub offset: usize,
}

impl Position {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn with_path(&self, path: Path) -> Self {
        Self {
            path,
            offset: self.offset,
        }
    }

    pub fn with_offset(&self, offset: usize) -> Self {
        Self {
            path: self.path.clone(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Caret at `position`
    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    /// Range inside one node
    pub fn single(path: impl Into<Path>, start_offset: usize, end_offset: usize) -> Self {
        let path = path.into();
        Self {
            start: Position::new(path.clone(), start_offset),
            end: Position::new(path, end_offset),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single(&self) -> bool {
        self.start.path == self.end.path
    }

    pub fn is_forward(&self) -> bool {
        self.start <= self.end
    }

    pub fn is_backward(&self) -> bool {
        !self.is_forward()
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end.clone(),
            end: self.start.clone(),
        }
    }

    /// Same range with `start <= end`
    pub fn normalized(&self) -> Self {
        if self.is_backward() {
            self.reversed()
        } else {
            self.clone()
        }
    }

    /// Caret at the front (`at_start`) or back of the range
    pub fn collapse(&self, at_start: bool) -> Self {
        let normalized = self.normalized();
        if at_start {
            Selection::collapsed(normalized.start)
        } else {
            Selection::collapsed(normalized.end)
        }
    }

    pub fn start_index(&self) -> usize {
        self.normalized().start.offset
    }

    pub fn end_index(&self) -> usize {
        self.normalized().end.offset
    }

    pub fn with_start(&self, start: Position) -> Self {
        Self {
            start,
            end: self.end.clone(),
        }
    }

    pub fn with_end(&self, end: Position) -> Self {
        Self {
            start: self.start.clone(),
            end,
        }
    }
}

/// Why the selection last changed; carried to selection listeners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionUpdateReason {
    UiEvent,
    #[default]
    Transaction,
    Remote,
    SelectAll,
    SearchHighlight,
}
