//! Component expansion.
//!
//! [`substitute`] rewrites placeholders and the content slot inside one
//! subtree; the [`Expander`] resolves import declarations, walks scopes and
//! splices loaded components in place of the elements that call them.

mod expand;
mod substitute;

pub use expand::{AliasTable, Expander};
pub use substitute::substitute;

use crate::dom::{Attributes, Element, Node};

/// The attributes and children of the element that triggered a component
/// expansion.
///
/// Borrowed for the duration of one expansion; substitution clones out of it
/// and never mutates it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerContext<'a> {
    pub attrs: Option<&'a Attributes>,
    pub children: Option<&'a [Node]>,
}

impl<'a> CallerContext<'a> {
    /// No caller: placeholders stay literal and slot markers are deleted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Caller context supplied by a calling element.
    pub fn from_element(element: &'a Element) -> Self {
        Self {
            attrs: Some(&element.attrs),
            children: Some(&element.children),
        }
    }

    /// Only children, no attributes.
    pub fn with_children(children: &'a [Node]) -> Self {
        Self {
            attrs: None,
            children: Some(children),
        }
    }

    /// Replace the attribute set.
    pub fn attrs(mut self, attrs: Option<&'a Attributes>) -> Self {
        self.attrs = attrs;
        self
    }
}
