//! # Node Paths
//!
//! A [`Path`] addresses a node by the child index taken at every level, starting
//! below the document root. Paths order lexicographically, and a strict prefix sorts
//! before the paths it prefixes, which is exactly document (pre-)order.
//!
//! Paths are coordinates, not identities: any structural edit before a node
//! changes the path that reaches it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The empty path, addressing the document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the parent node. The root is its own parent.
    pub fn parent(&self) -> Path {
        let mut indices = self.0.clone();
        indices.pop();
        Path(indices)
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Next sibling. The root has no siblings and is returned unchanged.
    pub fn next(&self) -> Path {
        self.next_n(1)
    }

    pub fn next_n(&self, n: usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last += n;
        }
        Path(indices)
    }

    /// Previous sibling, or `None` for a first child or the root
    pub fn previous(&self) -> Option<Path> {
        match self.0.last() {
            Some(&last) if last > 0 => {
                let mut indices = self.0.clone();
                indices.pop();
                indices.push(last - 1);
                Some(Path(indices))
            }
            _ => None,
        }
    }

    /// True if `self` is a strict prefix of `other`
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_parent_of(&self, other: &Path) -> bool {
        self.0.len() + 1 == other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_sibling_of(&self, other: &Path) -> bool {
        !self.is_root() && self.0.len() == other.0.len() && self.parent() == other.parent()
    }

    /// Replace the index at `depth`, leaving deeper components untouched
    pub(crate) fn with_index_at(&self, depth: usize, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices[depth] = index;
        Path(indices)
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Path(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Path(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
