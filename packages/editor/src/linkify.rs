//! Plain-text paste: one node per line, with bare links and phone numbers turned
//! into `href` spans.

use crate::delta::{Attributes, Delta};
use crate::node::Node;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

pub const HREF_ATTRIBUTE: &str = "href";

// Both patterns are constants, so compiling them cannot fail
fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"]*[^\s<>".,;:!?)\]']"#)
            .expect("url pattern is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"(?:\+\d{1,3}[\s-]?)?(?:\(\d{2,4}\)[\s-]?)?\b\d{3,4}[\s-]?\d{3,4}\b")
            .expect("phone pattern is valid")
    })
}

fn href(target: String) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(HREF_ATTRIBUTE.to_string(), json!(target));
    attributes
}

/// Text of one line as a delta, links and phone numbers carrying `href`
pub fn linkify_line(line: &str) -> Delta {
    let mut spans: Vec<(usize, usize, Attributes)> = url_regex()
        .find_iter(line)
        .map(|m| (m.start(), m.end(), href(m.as_str().to_string())))
        .collect();

    for m in phone_regex().find_iter(line) {
        let overlaps = spans
            .iter()
            .any(|(start, end, _)| m.start() < *end && *start < m.end());
        if !overlaps {
            let number: String = m
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '+')
                .collect();
            spans.push((m.start(), m.end(), href(format!("tel:{number}"))));
        }
    }
    spans.sort_by_key(|(start, _, _)| *start);

    let mut delta = Delta::new();
    let mut cursor = 0;
    for (start, end, attributes) in spans {
        delta = delta
            .insert(&line[cursor..start])
            .insert_with(&line[start..end], attributes);
        cursor = end;
    }
    delta.insert(&line[cursor..])
}

/// Split pasted text into nodes of `block_type`, one per line
pub fn plain_text_to_nodes(text: &str, block_type: &str) -> Vec<Node> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| Node::new(block_type).with_delta(linkify_line(line)))
        .collect()
}
