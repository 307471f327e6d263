//! Markdown rendering for htms.
//!
//! Wraps pulldown-cmark behind a renderer whose extensions can be switched on
//! and off individually, and extracts YAML frontmatter from Markdown sources.

pub mod frontmatter;
pub mod options;
pub mod render;

pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use options::{Extensions, MarkdownOptions, RenderOptions};
pub use render::MarkdownRenderer;
