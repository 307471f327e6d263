//! Placeholder substitution and slot injection.

use crate::config::{Placeholder, TemplateConfig};
use crate::dom::{Attributes, Node};

use super::CallerContext;

/// Substitute `caller` into `node` and its whole subtree.
///
/// With caller attributes, every placeholder in attribute names, attribute
/// values and text is replaced by the caller attribute of the same name (or
/// the empty string). The first slot marker in a text node is replaced by
/// clones of the caller's children, or deleted when there are none. A text
/// node may therefore expand to several nodes.
pub fn substitute(node: Node, template: &TemplateConfig, caller: CallerContext<'_>) -> Vec<Node> {
    match node {
        Node::Element(mut element) => {
            if let Some(attrs) = caller.attrs {
                let original = std::mem::take(&mut element.attrs);
                element.attrs = rewrite_attributes(original, &template.attribute, attrs);
            }

            element.children = std::mem::take(&mut element.children)
                .into_iter()
                .flat_map(|child| substitute(child, template, caller))
                .collect();

            vec![Node::Element(element)]
        }
        Node::Text(text) => substitute_text(text, template, caller),
        other => vec![other],
    }
}

fn rewrite_attributes(attrs: Attributes, placeholder: &Placeholder, caller: &Attributes) -> Attributes {
    let mut rewritten = Attributes::with_capacity(attrs.len());
    for (name, value) in attrs {
        let new_name = placeholder.replace(&name, caller);
        if new_name.is_empty() {
            tracing::debug!("Dropping attribute '{}' renamed to nothing", name);
            continue;
        }
        let new_value = placeholder.replace(&value, caller).into_owned();
        rewritten.insert(new_name.into_owned(), new_value);
    }
    rewritten
}

fn substitute_text(text: String, template: &TemplateConfig, caller: CallerContext<'_>) -> Vec<Node> {
    let marker = template.nesting.as_str();

    if !marker.is_empty() {
        if let Some((before, after)) = text.split_once(marker) {
            let mut out = Vec::new();
            push_text(&mut out, fill(before, template, caller));
            if let Some(children) = caller.children {
                out.extend(children.iter().cloned());
            }
            push_text(&mut out, fill(after, template, caller));
            return out;
        }
    }

    match caller.attrs {
        Some(attrs) => vec![Node::Text(template.attribute.replace(&text, attrs).into_owned())],
        None => vec![Node::Text(text)],
    }
}

fn fill(text: &str, template: &TemplateConfig, caller: CallerContext<'_>) -> String {
    match caller.attrs {
        Some(attrs) => template.attribute.replace(text, attrs).into_owned(),
        None => text.to_string(),
    }
}

fn push_text(out: &mut Vec<Node>, text: String) {
    if !text.is_empty() {
        out.push(Node::Text(text));
    }
}
