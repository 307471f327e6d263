//! HTML serialization through html5ever's serializer.

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};

use super::{Element, Node};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Serialize a list of nodes to an HTML string.
pub fn to_html(nodes: &[Node]) -> io::Result<String> {
    let mut buf = Vec::new();
    serialize(
        &mut buf,
        &Fragment(nodes),
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;

    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn element_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn attribute_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

struct Fragment<'a>(&'a [Node]);

impl Serialize for Fragment<'_> {
    fn serialize<S>(&self, serializer: &mut S, _traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        for node in self.0 {
            node.serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match self {
            Node::Element(element) => element.serialize(serializer, traversal_scope),
            Node::Text(text) => serializer.write_text(text),
            Node::Comment(text) => serializer.write_comment(text),
            Node::Doctype(name) => serializer.write_doctype(name),
        }
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);

        if include_node {
            let attrs: Vec<(QualName, &str)> = self
                .attrs
                .iter()
                .map(|(name, value)| (attribute_name(name), value.as_str()))
                .collect();
            serializer.start_elem(
                element_name(&self.name),
                attrs.iter().map(|(name, value)| (name, *value)),
            )?;
        }

        for child in &self.children {
            child.serialize(serializer, TraversalScope::IncludeNode)?;
        }

        if include_node {
            serializer.end_elem(element_name(&self.name))?;
        }
        Ok(())
    }
}
