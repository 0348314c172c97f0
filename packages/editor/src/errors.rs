//! Error types for the editor

use crate::path::Path;
use thiserror::Error;

/// Coarse classification of [`EditorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPath,
    InvalidArgument,
    LengthMismatch,
    NotEditable,
    HistorySealed,
    Serialization,
    Io,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: Path, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Length mismatch: expected at most {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Editor is not editable")]
    NotEditable,

    #[error("History item is sealed")]
    HistorySealed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub(crate) fn invalid_path(path: &Path, reason: impl Into<String>) -> Self {
        EditorError::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::InvalidPath { .. } => ErrorKind::InvalidPath,
            EditorError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EditorError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            EditorError::NotEditable => ErrorKind::NotEditable,
            EditorError::HistorySealed => ErrorKind::HistorySealed,
            EditorError::Json(_) => ErrorKind::Serialization,
            EditorError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result alias used throughout the crate
pub type EditorResult<T> = Result<T, EditorError>;
