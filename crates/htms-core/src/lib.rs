//! Template expansion engine for htms.
//!
//! Resolves component imports, substitutes `{{placeholders}}` from the calling
//! element's attributes and injects the caller's children into the content
//! slot of the component it expands. Every expansion step is parameterized by
//! a per-file [`Config`] produced by the [`ConfigResolver`].

pub mod config;
pub mod dom;
pub mod error;
pub mod loader;
pub mod paths;
pub mod template;

pub use config::{Config, ConfigError, ConfigPatch, ConfigResolver, Route};
pub use dom::{parse_fragment, Attributes, Document, Element, Node};
pub use error::LoadError;
pub use loader::{load_file, MarkdownPage};
pub use template::{substitute, AliasTable, CallerContext, Expander};
