//! Numbered-list markers.
//!
//! Nesting depth picks the numbering style: decimal, then letters, then roman
//! numerals, cycling for deeper levels.

use crate::document::Document;
use crate::node::BlockType;
use crate::path::Path;

pub const NUMBER_ATTRIBUTE: &str = "number";

pub struct NumberFormatter;

impl NumberFormatter {
    /// Bijective base-26: 1 → "a", 26 → "z", 27 → "aa". Zero formats as "".
    pub fn to_latin_letters(n: usize) -> String {
        let mut letters = Vec::new();
        let mut n = n;
        while n > 0 {
            n -= 1;
            letters.push(b'a' + (n % 26) as u8);
            n /= 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// Lowercase roman numerals. Zero formats as "".
    pub fn to_roman_numerals(n: usize) -> String {
        const NUMERALS: [(usize, &str); 13] = [
            (1000, "m"),
            (900, "cm"),
            (500, "d"),
            (400, "cd"),
            (100, "c"),
            (90, "xc"),
            (50, "l"),
            (40, "xl"),
            (10, "x"),
            (9, "ix"),
            (5, "v"),
            (4, "iv"),
            (1, "i"),
        ];

        let mut remaining = n;
        let mut roman = String::new();
        for (value, numeral) in NUMERALS {
            while remaining >= value {
                roman.push_str(numeral);
                remaining -= value;
            }
        }
        roman
    }

    /// Format `number` for a list nested `level` numbered lists deep
    pub fn format_level(number: usize, level: usize) -> String {
        match level % 3 {
            0 => number.to_string(),
            1 => Self::to_latin_letters(number),
            _ => Self::to_roman_numerals(number),
        }
    }
}

/// Marker such as `"3."`, `"c."` or `"iii."` for the numbered-list node at `path`.
///
/// The number counts back over consecutive numbered-list siblings; a sibling with a
/// `number` attribute restarts the count from that value.
pub fn numbered_list_marker(document: &Document, path: &Path) -> Option<String> {
    let node = document.node_at_path(path)?;
    if node.block_type() != BlockType::NumberedList {
        return None;
    }

    let mut offset = 0;
    let mut current = path.clone();
    let number = loop {
        let start = document
            .node_at_path(&current)
            .and_then(|node| node.attributes.get(NUMBER_ATTRIBUTE))
            .and_then(|value| value.as_u64());
        if let Some(start) = start {
            break start as usize + offset;
        }
        match current.previous() {
            Some(previous)
                if document
                    .node_at_path(&previous)
                    .is_some_and(|node| node.block_type() == BlockType::NumberedList) =>
            {
                offset += 1;
                current = previous;
            }
            _ => break 1 + offset,
        }
    };

    let mut level = 0;
    let mut ancestor = path.parent();
    while !ancestor.is_root() {
        if document
            .node_at_path(&ancestor)
            .is_some_and(|node| node.block_type() == BlockType::NumberedList)
        {
            level += 1;
        }
        ancestor = ancestor.parent();
    }

    Some(format!("{}.", NumberFormatter::format_level(number, level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, PAGE};
    use serde_json::json;

    fn item(text: &str) -> Node {
        Node::new("numbered_list").with_delta(crate::Delta::from_text(text))
    }

    #[test]
    fn test_latin_letters() {
        assert_eq!(NumberFormatter::to_latin_letters(1), "a");
        assert_eq!(NumberFormatter::to_latin_letters(26), "z");
        assert_eq!(NumberFormatter::to_latin_letters(27), "aa");
        assert_eq!(NumberFormatter::to_latin_letters(52), "az");
        assert_eq!(NumberFormatter::to_latin_letters(703), "aaa");
        assert_eq!(NumberFormatter::to_latin_letters(0), "");
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(NumberFormatter::to_roman_numerals(1), "i");
        assert_eq!(NumberFormatter::to_roman_numerals(4), "iv");
        assert_eq!(NumberFormatter::to_roman_numerals(14), "xiv");
        assert_eq!(NumberFormatter::to_roman_numerals(49), "xlix");
        assert_eq!(NumberFormatter::to_roman_numerals(1994), "mcmxciv");
    }

    #[test]
    fn test_marker_counts_consecutive_siblings() {
        let document = Document::from_root(Node::new(PAGE).with_children(vec![
            item("one"),
            item("two").with_children(vec![item("a"), item("b").with_children(vec![item("i")])]),
            Node::paragraph("break"),
            item("restart"),
            item("five").with_attribute(NUMBER_ATTRIBUTE, json!(5)),
            item("six"),
        ]));

        let marker = |path: &[usize]| numbered_list_marker(&document, &Path::from(path));
        assert_eq!(marker(&[0]).as_deref(), Some("1."));
        assert_eq!(marker(&[1]).as_deref(), Some("2."));
        assert_eq!(marker(&[1, 1]).as_deref(), Some("b."));
        assert_eq!(marker(&[1, 1, 0]).as_deref(), Some("i."));
        assert_eq!(marker(&[3]).as_deref(), Some("1."));
        assert_eq!(marker(&[4]).as_deref(), Some("5."));
        assert_eq!(marker(&[5]).as_deref(), Some("6."));
        assert_eq!(marker(&[2]), None);
    }
}
