//! # Document Nodes
//!
//! A [`Node`] is an owned value: a block type, attributes, optional text content and
//! ordered children. Nodes have no identity of their own; inside a
//! [`Document`](crate::Document) they are addressed by [`Path`](crate::Path), and
//! their parent is the node at `path.parent()`.
//!
//! ## JSON
//!
//! ```text
//! {"type": "paragraph", "attributes": {"delta": [{"insert": "hi"}]}, "children": []}
//! ```
//!
//! `attributes` and `children` are omitted when empty.

use crate::delta::{Attributes, Delta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARAGRAPH: &str = "paragraph";
pub const PAGE: &str = "page";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeJson", into = "NodeJson")]
pub struct Node {
    pub node_type: String,
    pub attributes: Attributes,
    pub delta: Option<Delta>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attributes: Attributes::new(),
            delta: None,
            children: Vec::new(),
        }
    }

    /// Paragraph carrying plain `text`
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::new(PARAGRAPH).with_delta(Delta::from_text(text))
    }

    pub fn with_delta(mut self, delta: Delta) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn block_type(&self) -> BlockType {
        BlockType::from(self.node_type.as_str())
    }

    /// Length of the text content; zero for nodes without a delta
    pub fn text_len(&self) -> usize {
        self.delta.as_ref().map_or(0, Delta::len)
    }

    pub fn plain_text(&self) -> String {
        self.delta.as_ref().map(Delta::to_plain_text).unwrap_or_default()
    }

    /// A paragraph with no text and no formatting
    pub fn is_empty_paragraph(&self) -> bool {
        self.block_type() == BlockType::Paragraph
            && self.delta.as_ref().map_or(true, Delta::is_empty)
    }

    /// Descendant at a path relative to this node
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Relative path of the deepest last descendant (empty when childless)
    pub fn deepest_last_child_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = self;
        while let Some(last) = node.children.last() {
            path.push(node.children.len() - 1);
            node = last;
        }
        path
    }
}

/// Block types with built-in behaviour. Unknown types round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockType {
    Page,
    Paragraph,
    Heading,
    Quote,
    BulletedList,
    NumberedList,
    TodoList,
    Divider,
    Image,
    Other(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Page => PAGE,
            BlockType::Paragraph => PARAGRAPH,
            BlockType::Heading => "heading",
            BlockType::Quote => "quote",
            BlockType::BulletedList => "bulleted_list",
            BlockType::NumberedList => "numbered_list",
            BlockType::TodoList => "todo_list",
            BlockType::Divider => "divider",
            BlockType::Image => "image",
            BlockType::Other(name) => name,
        }
    }

    /// List rows nest their children under the text-bearing row
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            BlockType::BulletedList | BlockType::NumberedList | BlockType::TodoList
        )
    }

    pub fn has_text(&self) -> bool {
        matches!(
            self,
            BlockType::Paragraph
                | BlockType::Heading
                | BlockType::Quote
                | BlockType::BulletedList
                | BlockType::NumberedList
                | BlockType::TodoList
        )
    }
}

impl From<&str> for BlockType {
    fn from(name: &str) -> Self {
        match name {
            PAGE => BlockType::Page,
            PARAGRAPH => BlockType::Paragraph,
            "heading" => BlockType::Heading,
            "quote" => BlockType::Quote,
            "bulleted_list" => BlockType::BulletedList,
            "numbered_list" => BlockType::NumberedList,
            "todo_list" => BlockType::TodoList,
            "divider" => BlockType::Divider,
            "image" => BlockType::Image,
            other => BlockType::Other(other.to_string()),
        }
    }
}

/// Wire shape of a node: the delta lives inside `attributes`
#[derive(Serialize, Deserialize)]
struct NodeJson {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "NodeData::is_empty")]
    attributes: NodeData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

#[derive(Default, Serialize, Deserialize)]
struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delta: Option<Delta>,
    #[serde(flatten)]
    rest: Attributes,
}

impl NodeData {
    fn is_empty(&self) -> bool {
        self.delta.is_none() && self.rest.is_empty()
    }
}

impl From<NodeJson> for Node {
    fn from(json: NodeJson) -> Self {
        Node {
            node_type: json.node_type,
            attributes: json.attributes.rest,
            delta: json.attributes.delta,
            children: json.children,
        }
    }
}

impl From<Node> for NodeJson {
    fn from(node: Node) -> Self {
        NodeJson {
            node_type: node.node_type,
            attributes: NodeData {
                delta: node.delta,
                rest: node.attributes,
            },
            children: node.children,
        }
    }
}
