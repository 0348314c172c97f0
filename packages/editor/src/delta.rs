//! # Rich-Text Deltas
//!
//! A [`Delta`] is an ordered run of insert/retain/delete operations. A delta made only of
//! inserts is a document: the text content of one node. A delta that also retains and
//! deletes is a change that can be composed onto a document.
//!
//! Lengths and offsets count UTF-16 code units, so an astral character such as an
//! emoji is two units long.
//!
//! ## JSON
//!
//! ```text
//! [{"insert": "Hello", "attributes": {"bold": true}}, {"retain": 3}, {"delete": 2}]
//! ```

use crate::errors::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Formatting attributes of a text run or node. `null` values remove a key when composed.
pub type Attributes = serde_json::Map<String, Value>;

/// One run of a delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOperation {
    Insert {
        insert: String,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },
    Retain {
        retain: usize,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },
    Delete {
        delete: usize,
    },
}

impl TextOperation {
    pub fn len(&self) -> usize {
        match self {
            TextOperation::Insert { insert, .. } => utf16_len(insert),
            TextOperation::Retain { retain, .. } => *retain,
            TextOperation::Delete { delete } => *delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            TextOperation::Insert { attributes, .. } | TextOperation::Retain { attributes, .. } => {
                Some(attributes)
            }
            TextOperation::Delete { .. } => None,
        }
    }

    fn is_insert(&self) -> bool {
        matches!(self, TextOperation::Insert { .. })
    }

    fn is_delete(&self) -> bool {
        matches!(self, TextOperation::Delete { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TextOperation>", into = "Vec<TextOperation>")]
pub struct Delta {
    ops: Vec<TextOperation>,
}

impl From<Vec<TextOperation>> for Delta {
    fn from(ops: Vec<TextOperation>) -> Self {
        Delta::from_ops(ops)
    }
}

impl From<Delta> for Vec<TextOperation> {
    fn from(delta: Delta) -> Self {
        delta.ops
    }
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a delta from raw operations, normalizing as [`Delta::push`] does
    pub fn from_ops(ops: impl IntoIterator<Item = TextOperation>) -> Self {
        let mut delta = Delta::new();
        for op in ops {
            delta.push(op);
        }
        delta
    }

    /// Plain-text document delta
    pub fn from_text(text: impl Into<String>) -> Self {
        Delta::new().insert(text)
    }

    pub fn ops(&self) -> &[TextOperation] {
        &self.ops
    }

    pub fn insert(self, text: impl Into<String>) -> Self {
        self.insert_with(text, Attributes::new())
    }

    pub fn insert_with(mut self, text: impl Into<String>, attributes: Attributes) -> Self {
        self.push(TextOperation::Insert {
            insert: text.into(),
            attributes,
        });
        self
    }

    pub fn retain(self, length: usize) -> Self {
        self.retain_with(length, Attributes::new())
    }

    pub fn retain_with(mut self, length: usize, attributes: Attributes) -> Self {
        self.push(TextOperation::Retain {
            retain: length,
            attributes,
        });
        self
    }

    pub fn delete(mut self, length: usize) -> Self {
        self.push(TextOperation::Delete { delete: length });
        self
    }

    /// Append an operation, merging it into the previous run where possible.
    ///
    /// Zero-length operations are dropped and an insert that follows a delete is
    /// placed before it, so equal changes always have equal representations.
    pub fn push(&mut self, op: TextOperation) {
        if op.is_empty() {
            return;
        }

        let mut index = self.ops.len();
        if let Some(last) = self.ops.last_mut() {
            if let (TextOperation::Delete { delete }, TextOperation::Delete { delete: more }) =
                (&mut *last, &op)
            {
                *delete += more;
                return;
            }
            if last.is_delete() && op.is_insert() {
                index -= 1;
            }
        }

        if index > 0 {
            match (&mut self.ops[index - 1], &op) {
                (
                    TextOperation::Insert { insert, attributes },
                    TextOperation::Insert {
                        insert: more,
                        attributes: more_attributes,
                    },
                ) if attributes == more_attributes => {
                    insert.push_str(more);
                    return;
                }
                (
                    TextOperation::Retain { retain, attributes },
                    TextOperation::Retain {
                        retain: more,
                        attributes: more_attributes,
                    },
                ) if attributes == more_attributes => {
                    *retain += more;
                    return;
                }
                _ => {}
            }
        }

        self.ops.insert(index, op);
    }

    /// Rendered length: the sum of insert and retain lengths
    pub fn len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_delete())
            .map(TextOperation::len)
            .sum()
    }

    /// Length of the text this delta applies to when used as a change
    pub fn base_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_insert())
            .map(TextOperation::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn to_plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TextOperation::Insert { insert, .. } => Some(insert.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Remove a trailing unformatted retain, which is implied
    pub fn chop(mut self) -> Self {
        if let Some(TextOperation::Retain { attributes, .. }) = self.ops.last() {
            if attributes.is_empty() {
                self.ops.pop();
            }
        }
        self
    }

    pub fn concat(&self, other: &Delta) -> Delta {
        let mut result = self.clone();
        for op in &other.ops {
            result.push(op.clone());
        }
        result
    }

    /// Sub-delta covering `[start, end)` of the rendered text. Runs are split at the
    /// boundaries and keep their attributes. Out-of-range bounds are clamped.
    pub fn slice(&self, start: usize, end: usize) -> Delta {
        let mut result = Delta::new();
        if start >= end {
            return result;
        }
        let mut index = 0;
        for op in self.ops.iter().filter(|op| !op.is_delete()) {
            if index >= end {
                break;
            }
            let op_len = op.len();
            let op_end = index + op_len;
            if op_end > start {
                let from = start.saturating_sub(index);
                let to = op_len.min(end - index);
                result.push(slice_op(op, from, to));
            }
            index = op_end;
        }
        result
    }

    /// Slice from `start` to the end of the rendered text
    pub fn slice_from(&self, start: usize) -> Delta {
        self.slice(start, self.len())
    }

    /// Compose `other` onto `self`, producing the single delta equivalent to applying
    /// `self` then `other`.
    ///
    /// Fails with [`EditorError::LengthMismatch`] when `other` retains or deletes past
    /// the end of `self`.
    pub fn compose(&self, other: &Delta) -> EditorResult<Delta> {
        let available = self.len();
        let required = other.base_len();
        if required > available {
            return Err(EditorError::LengthMismatch {
                expected: available,
                actual: required,
            });
        }

        let mut this_iter = OpIter::new(&self.ops);
        let mut other_iter = OpIter::new(&other.ops);
        let mut result = Delta::new();

        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek().is_some_and(TextOperation::is_insert) {
                result.push(other_iter.next(usize::MAX));
            } else if this_iter.peek().is_some_and(TextOperation::is_delete) {
                result.push(this_iter.next(usize::MAX));
            } else {
                let length = this_iter.peek_length().min(other_iter.peek_length());
                let this_op = this_iter.next(length);
                let other_op = other_iter.next(length);

                match other_op {
                    TextOperation::Retain {
                        attributes: other_attributes,
                        ..
                    } => {
                        let composed = match this_op {
                            TextOperation::Retain { attributes, .. } => TextOperation::Retain {
                                retain: length,
                                attributes: compose_attributes(&attributes, &other_attributes, true),
                            },
                            TextOperation::Insert { insert, attributes } => TextOperation::Insert {
                                insert,
                                attributes: compose_attributes(&attributes, &other_attributes, false),
                            },
                            TextOperation::Delete { .. } => continue,
                        };
                        result.push(composed.clone());

                        // Nothing left to change: the rest of `self` carries over untouched
                        if !other_iter.has_next() && result.ops.last() == Some(&composed) {
                            let rest = Delta::from_ops(this_iter.rest());
                            return Ok(result.concat(&rest).chop());
                        }
                    }
                    TextOperation::Delete { .. } => {
                        if let TextOperation::Retain { .. } = this_op {
                            result.push(TextOperation::Delete { delete: length });
                        }
                    }
                    TextOperation::Insert { .. } => {}
                }
            }
        }

        Ok(result.chop())
    }

    /// The change that undoes `self` when composed onto `base.compose(self)`
    pub fn invert(&self, base: &Delta) -> Delta {
        let mut inverted = Delta::new();
        let mut base_index = 0;
        for op in &self.ops {
            match op {
                TextOperation::Insert { insert, .. } => {
                    inverted.push(TextOperation::Delete {
                        delete: utf16_len(insert),
                    });
                }
                TextOperation::Retain { retain, attributes } if attributes.is_empty() => {
                    inverted.push(TextOperation::Retain {
                        retain: *retain,
                        attributes: Attributes::new(),
                    });
                    base_index += retain;
                }
                TextOperation::Retain { retain, attributes } => {
                    for base_op in base.slice(base_index, base_index + retain).ops {
                        let base_attributes = base_op.attributes().cloned().unwrap_or_default();
                        inverted.push(TextOperation::Retain {
                            retain: base_op.len(),
                            attributes: invert_attributes(attributes, &base_attributes),
                        });
                    }
                    base_index += retain;
                }
                TextOperation::Delete { delete } => {
                    for base_op in base.slice(base_index, base_index + delete).ops {
                        inverted.push(base_op);
                    }
                    base_index += delete;
                }
            }
        }
        inverted.chop()
    }

    /// Attributes of the character before `index`, used to continue formatting
    /// when typing. Empty at the start of the text.
    pub fn attributes_at(&self, index: usize) -> Attributes {
        if index == 0 {
            return Attributes::new();
        }
        let mut position = 0;
        for op in self.ops.iter().filter(|op| !op.is_delete()) {
            position += op.len();
            if position >= index {
                return op.attributes().cloned().unwrap_or_default();
            }
        }
        Attributes::new()
    }
}

/// Merge `b` over `a`. With `keep_null` false, `null` values in `b` drop the key.
pub fn compose_attributes(a: &Attributes, b: &Attributes, keep_null: bool) -> Attributes {
    let mut attributes: Attributes = b
        .iter()
        .filter(|(_, value)| keep_null || !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, value) in a {
        if !b.contains_key(key) {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes
}

/// Attributes that turn `base` formatting back after `attributes` were applied over it
pub fn invert_attributes(attributes: &Attributes, base: &Attributes) -> Attributes {
    let mut inverted = Attributes::new();
    for (key, base_value) in base {
        if attributes.get(key).is_some_and(|value| value != base_value) {
            inverted.insert(key.clone(), base_value.clone());
        }
    }
    for key in attributes.keys() {
        if !base.contains_key(key) {
            inverted.insert(key.clone(), Value::Null);
        }
    }
    inverted
}

pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte index of UTF-16 offset `offset`. An offset inside a surrogate pair moves
/// past the pair so astral characters are never split.
fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units >= offset {
            return index;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Substring by UTF-16 offsets, clamped to the text
pub(crate) fn utf16_slice(text: &str, start: usize, end: usize) -> &str {
    let begin = utf16_to_byte(text, start);
    let finish = utf16_to_byte(text, end.max(start));
    &text[begin..finish]
}

/// UTF-16 width of the character ending at `offset`, 0 at the start of the text
pub(crate) fn utf16_width_before(text: &str, offset: usize) -> usize {
    let mut units = 0;
    let mut width = 0;
    for ch in text.chars() {
        if units >= offset {
            break;
        }
        width = ch.len_utf16();
        units += width;
    }
    width
}

fn slice_op(op: &TextOperation, from: usize, to: usize) -> TextOperation {
    match op {
        TextOperation::Insert { insert, attributes } => TextOperation::Insert {
            insert: utf16_slice(insert, from, to).to_string(),
            attributes: attributes.clone(),
        },
        TextOperation::Retain { attributes, .. } => TextOperation::Retain {
            retain: to - from,
            attributes: attributes.clone(),
        },
        TextOperation::Delete { .. } => TextOperation::Delete { delete: to - from },
    }
}

/// Walks a run list handing out pieces of at most a requested length
struct OpIter<'a> {
    ops: &'a [TextOperation],
    index: usize,
    offset: usize,
}

impl<'a> OpIter<'a> {
    fn new(ops: &'a [TextOperation]) -> Self {
        Self {
            ops,
            index: 0,
            offset: 0,
        }
    }

    fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    fn peek(&self) -> Option<&'a TextOperation> {
        self.ops.get(self.index)
    }

    /// Remaining length of the current run; unbounded once exhausted
    fn peek_length(&self) -> usize {
        match self.peek() {
            Some(op) => op.len() - self.offset,
            None => usize::MAX,
        }
    }

    /// Past the end the iterator yields an unbounded plain retain
    fn next(&mut self, length: usize) -> TextOperation {
        let Some(op) = self.peek() else {
            return TextOperation::Retain {
                retain: usize::MAX,
                attributes: Attributes::new(),
            };
        };
        let offset = self.offset;
        let remaining = op.len() - offset;
        let taken = if length >= remaining {
            self.index += 1;
            self.offset = 0;
            remaining
        } else {
            self.offset += length;
            length
        };
        slice_op(op, offset, offset + taken)
    }

    fn rest(&mut self) -> Vec<TextOperation> {
        let mut rest = Vec::new();
        if self.offset > 0 {
            rest.push(self.next(usize::MAX));
        }
        rest.extend(self.ops[self.index..].iter().cloned());
        self.index = self.ops.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bold() -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("bold".to_string(), json!(true));
        attributes
    }

    #[test]
    fn test_push_merges_runs() {
        let delta = Delta::new().insert("ab").insert("cd").retain(0).delete(1).delete(2);
        assert_eq!(
            delta.ops(),
            &[
                TextOperation::Insert {
                    insert: "abcd".to_string(),
                    attributes: Attributes::new()
                },
                TextOperation::Delete { delete: 3 },
            ]
        );
    }

    #[test]
    fn test_insert_after_delete_is_reordered() {
        let delta = Delta::new().retain(2).delete(1).insert("x");
        assert_eq!(delta, Delta::new().retain(2).insert("x").delete(1));
    }

    #[test]
    fn test_compose_insert_into_document() {
        let doc = Delta::from_text("abcdef");
        let change = Delta::new().retain(3).insert("XY");
        let result = doc.compose(&change).unwrap();
        assert_eq!(result.to_plain_text(), "abcXYdef");
        assert_eq!(result.len(), 8);
    }

    #[test]
    fn test_compose_delete_and_format() {
        let doc = Delta::from_text("hello world");
        let change = Delta::new().retain_with(5, bold()).delete(6);
        let result = doc.compose(&change).unwrap();
        assert_eq!(result, Delta::new().insert_with("hello", bold()));
    }

    #[test]
    fn test_compose_null_attribute_removes_key() {
        let doc = Delta::new().insert_with("abc", bold());
        let mut unbold = Attributes::new();
        unbold.insert("bold".to_string(), Value::Null);
        let result = doc.compose(&Delta::new().retain_with(3, unbold)).unwrap();
        assert_eq!(result, Delta::from_text("abc"));
    }

    #[test]
    fn test_compose_rejects_overlong_retain() {
        let doc = Delta::from_text("abc");
        let err = doc.compose(&Delta::new().retain(2).delete(5)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::LengthMismatch);
    }

    #[test]
    fn test_compose_is_associative_on_text() {
        let a = Delta::from_text("0123456789");
        let b = Delta::new().retain(2).delete(3).insert("ab");
        let c = Delta::new().retain(1).insert("Z").retain(2).delete(1);

        let left = a.compose(&b).unwrap().compose(&c).unwrap();
        let right = a.compose(&b.compose(&c).unwrap()).unwrap();
        assert_eq!(left.to_plain_text(), right.to_plain_text());
        assert_eq!(left.to_plain_text(), "0Z1a56789");
    }

    #[test]
    fn test_slice_splits_runs_and_keeps_attributes() {
        let delta = Delta::from_text("ab").insert_with("cdef", bold()).insert("gh");
        let sliced = delta.slice(1, 5);
        assert_eq!(
            sliced,
            Delta::from_text("b").insert_with("cde", bold())
        );
        assert_eq!(delta.slice(0, delta.len()), delta);
        assert!(delta.slice(3, 3).is_empty());
        assert!(delta.slice(20, 30).is_empty());
    }

    #[test]
    fn test_lengths_count_utf16_units() {
        let delta = Delta::from_text("héllo wörld");
        assert_eq!(delta.len(), 11);
        assert_eq!(delta.slice(1, 5).to_plain_text(), "éllo");
        assert_eq!(delta.slice_from(6).to_plain_text(), "wörld");

        let emoji = Delta::from_text("a😀b");
        assert_eq!(emoji.len(), 4);
        assert_eq!(emoji.slice(1, 3).to_plain_text(), "😀");
        assert_eq!(emoji.slice_from(3).to_plain_text(), "b");
        let edited = emoji.compose(&Delta::new().retain(1).delete(2)).unwrap();
        assert_eq!(edited.to_plain_text(), "ab");
    }

    #[test]
    fn test_slice_never_splits_surrogate_pair() {
        assert_eq!(utf16_slice("😀x", 0, 1), "😀");
        assert_eq!(utf16_slice("😀x", 1, 3), "x");
        assert_eq!(utf16_width_before("a😀", 3), 2);
        assert_eq!(utf16_width_before("a😀", 1), 1);
        assert_eq!(utf16_width_before("a😀", 0), 0);
    }

    #[test]
    fn test_invert_restores_base() {
        let base = Delta::from_text("abc").insert_with("def", bold());
        let change = Delta::new().retain(1).delete(3).retain_with(1, {
            let mut italic = Attributes::new();
            italic.insert("italic".to_string(), json!(true));
            italic
        });
        let changed = base.compose(&change).unwrap();
        let restored = changed.compose(&change.invert(&base)).unwrap();
        assert_eq!(restored, base);
    }

    #[test]
    fn test_attributes_at_reads_previous_char() {
        let delta = Delta::from_text("ab").insert_with("cd", bold());
        assert!(delta.attributes_at(0).is_empty());
        assert!(delta.attributes_at(2).is_empty());
        assert_eq!(delta.attributes_at(3), bold());
        assert_eq!(delta.attributes_at(4), bold());
    }

    #[test]
    fn test_json_shape() {
        let delta = Delta::new().insert_with("hi", bold()).retain(2).delete(1);
        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            value,
            json!([{"insert": "hi", "attributes": {"bold": true}}, {"retain": 2}, {"delete": 1}])
        );
        let back: Delta = serde_json::from_value(value).unwrap();
        assert_eq!(back, delta);
    }

    #[test]
    fn test_json_normalizes_zero_length_runs() {
        let delta: Delta =
            serde_json::from_value(json!([{"insert": ""}, {"insert": "a"}, {"insert": "b"}])).unwrap();
        assert_eq!(delta, Delta::from_text("ab"));
    }
}
