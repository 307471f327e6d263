//! Owned markup trees.
//!
//! Nodes are plain values: splicing a subtree into another tree moves or
//! clones it, so no node is ever reachable from two trees at once.

mod parse;
mod serialize;

use indexmap::IndexMap;

pub use parse::parse_fragment;
pub use serialize::to_html;

/// Element attributes in source order. Names are unique.
pub type Attributes = IndexMap<String, String>;

/// A node in a markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.children.iter().map(Node::text_content).collect(),
            Node::Text(text) => text.clone(),
            Node::Comment(_) | Node::Doctype(_) => String::new(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name as produced by the parser (ASCII lowercase)
    pub name: String,

    pub attrs: Attributes,

    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Look up an attribute, ignoring ASCII case in the name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element's tag is `tag`, ignoring ASCII case.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }
}

/// A parsed source file: the top-level nodes of its tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Parse markup leniently into a document.
    pub fn parse(text: &str) -> Self {
        Self {
            children: parse_fragment(text),
        }
    }

    /// Serialize the document back to HTML.
    pub fn to_html(&self) -> std::io::Result<String> {
        to_html(&self.children)
    }
}
