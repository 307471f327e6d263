//! Source file loading.

use std::path::Path;

use htms_markdown::{extract_frontmatter, Frontmatter};

use crate::config::Config;
use crate::dom::{Attributes, Document};
use crate::error::LoadError;
use crate::paths::normalize;
use crate::template::{AliasTable, CallerContext, Expander};

/// A rendered and expanded Markdown file.
#[derive(Debug, Clone, Default)]
pub struct MarkdownPage {
    pub document: Document,
    pub frontmatter: Option<Frontmatter>,
}

impl MarkdownPage {
    /// Frontmatter fields as caller attributes for the renderer template.
    pub fn attributes(&self) -> Option<Attributes> {
        self.frontmatter.as_ref().map(|frontmatter| {
            frontmatter
                .fields
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    }
}

impl Expander<'_> {
    /// Load `path`, render it first if it is Markdown, and expand it with
    /// `caller` as the caller context.
    pub fn load(
        &mut self,
        path: &Path,
        caller: CallerContext<'_>,
        is_markdown: bool,
    ) -> Result<Document, LoadError> {
        self.load_source(path, caller, is_markdown)
            .map(|(document, _)| document)
    }

    /// Load a Markdown file, keeping its frontmatter.
    pub fn load_markdown(&mut self, path: &Path) -> Result<MarkdownPage, LoadError> {
        let (document, frontmatter) = self.load_source(path, CallerContext::none(), true)?;
        Ok(MarkdownPage {
            document,
            frontmatter,
        })
    }

    fn load_source(
        &mut self,
        path: &Path,
        caller: CallerContext<'_>,
        is_markdown: bool,
    ) -> Result<(Document, Option<Frontmatter>), LoadError> {
        let path = normalize(path);

        if let Some(pos) = self.stack.iter().position(|open| *open == path) {
            let chain = self.stack[pos..]
                .iter()
                .chain(std::iter::once(&path))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(LoadError::Recursion { chain });
        }

        let max_depth = self.config.imports.max_depth;
        if self.stack.len() > max_depth {
            return Err(LoadError::DepthExceeded {
                path,
                depth: max_depth,
            });
        }

        let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| LoadError::Encoding { path: path.clone() })?;

        let (frontmatter, markup) = if is_markdown {
            let (frontmatter, body) =
                extract_frontmatter(&text).map_err(|source| LoadError::Frontmatter {
                    path: path.clone(),
                    source,
                })?;
            (frontmatter, self.renderer.render(body))
        } else {
            (None, text)
        };

        tracing::debug!("Expanding {}", path.display());
        let document = Document::parse(&markup);
        let dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();

        self.stack.push(path);
        let children = self.expand(document.children, &dir, caller, &AliasTable::new());
        self.stack.pop();

        Ok((Document { children: children? }, frontmatter))
    }
}

/// Load and expand a single file with a fresh [`Expander`].
pub fn load_file(
    path: &Path,
    config: &Config,
    caller: CallerContext<'_>,
    is_markdown: bool,
) -> Result<Document, LoadError> {
    Expander::new(config).load(path, caller, is_markdown)
}
