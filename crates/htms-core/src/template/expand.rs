//! Scoped import resolution and component expansion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use htms_markdown::MarkdownRenderer;

use crate::config::Config;
use crate::dom::{Element, Node};
use crate::error::LoadError;
use crate::paths::normalize;

use super::{substitute, CallerContext};

/// Import aliases visible in one scope, keyed by uppercased alias.
///
/// Child scopes receive a copy, so declarations never leak into siblings and
/// a closer declaration shadows an inherited one.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, PathBuf>,
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `path`, replacing any inherited binding.
    pub fn declare(&mut self, alias: &str, path: PathBuf) {
        self.entries.insert(alias.to_uppercase(), path);
    }

    /// The component a tag refers to, if any.
    pub fn resolve(&self, tag: &str) -> Option<&Path> {
        self.entries.get(&tag.to_uppercase()).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Expands one source file and every component it pulls in.
///
/// Holds the configuration of the file being built, a Markdown renderer
/// built from it and the stack of component files currently being loaded.
pub struct Expander<'c> {
    pub(crate) config: &'c Config,
    pub(crate) renderer: MarkdownRenderer,
    pub(crate) stack: Vec<PathBuf>,
}

impl<'c> Expander<'c> {
    /// Create an expander for files built with `config`.
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            renderer: MarkdownRenderer::new(&config.md),
            stack: Vec::new(),
        }
    }

    /// Expand `nodes` declared in a file under `dir`.
    ///
    /// Import declarations are collected into a copy of `inherited` and
    /// dropped, every remaining node is substituted with `caller`, children
    /// are expanded in the new scope with the same caller, and finally
    /// elements whose tag is a known alias are replaced by the expanded
    /// component.
    ///
    /// Caller children injected into a slot are substituted again when their
    /// parent's children are expanded, so they see the caller's attributes.
    pub fn expand(
        &mut self,
        nodes: Vec<Node>,
        dir: &Path,
        caller: CallerContext<'_>,
        inherited: &AliasTable,
    ) -> Result<Vec<Node>, LoadError> {
        let config = self.config;
        let mut aliases = inherited.clone();

        let mut body = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element(element) if element.is(&config.imports.tag) => {
                    self.declare(&mut aliases, &element, dir);
                }
                other => body.push(other),
            }
        }

        let body: Vec<Node> = body
            .into_iter()
            .flat_map(|node| substitute(node, &config.template, caller))
            .collect();

        let mut out = Vec::with_capacity(body.len());
        for node in body {
            let Node::Element(mut element) = node else {
                out.push(node);
                continue;
            };

            if !element.children.is_empty() {
                let children = std::mem::take(&mut element.children);
                element.children = self.expand(children, dir, caller, &aliases)?;
            }

            match aliases.resolve(&element.name) {
                Some(path) => {
                    let path = path.to_path_buf();
                    out.extend(self.expand_component(element, &path)?);
                }
                None => out.push(Node::Element(element)),
            }
        }

        Ok(out)
    }

    fn declare(&self, aliases: &mut AliasTable, element: &Element, dir: &Path) {
        let imports = &self.config.imports;
        let (Some(source), Some(alias)) = (element.attr(&imports.source), element.attr(&imports.alias))
        else {
            tracing::warn!(
                "Ignoring <{}> in {} without both '{}' and '{}' attributes",
                imports.tag,
                dir.display(),
                imports.source,
                imports.alias
            );
            return;
        };

        let path = self.resolve_source(source, dir);
        tracing::debug!("Import {} -> {}", alias, path.display());
        aliases.declare(alias, path);
    }

    /// Resolve an import source relative to `dir`, or to the project root
    /// when it starts with the root prefix.
    fn resolve_source(&self, source: &str, dir: &Path) -> PathBuf {
        let prefix = self.config.imports.root_prefix.as_str();
        let path = match source.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() => self.config.files.root.join(rest),
            _ => dir.join(source),
        };
        normalize(&path)
    }

    fn expand_component(&mut self, element: Element, path: &Path) -> Result<Vec<Node>, LoadError> {
        if !path.is_file() {
            tracing::warn!(
                "Unresolved import <{}>: {} does not exist, emitting it literally",
                element.name,
                path.display()
            );
            return Ok(vec![Node::Element(element)]);
        }

        let document = self.load(path, CallerContext::from_element(&element), false)?;
        Ok(document.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_fragment, Document};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn build(dir: &Path, file: &str) -> Result<String, LoadError> {
        let config = Config::with_root(dir);
        let mut expander = Expander::new(&config);
        let document = expander.load(&dir.join(file), CallerContext::none(), false)?;
        Ok(document.to_html().unwrap())
    }

    #[test]
    fn expands_imported_component() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("header.htms"), "<h1>{{title}}</h1>").unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="header.htms" as="HEADER"/><HEADER title="Hi"/>"#,
        )
        .unwrap();

        assert_eq!(build(temp.path(), "index.html").unwrap(), "<h1>Hi</h1>");
    }

    #[test]
    fn imports_do_not_leak_into_siblings() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.htms"), "<b>A</b>").unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<div><IMPORT src="a.htms" as="X"/><X/></div><section><X/></section>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            "<div><b>A</b></div><section><x></x></section>"
        );
    }

    #[test]
    fn closer_imports_shadow_inherited_ones() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.htms"), "<b>A</b>").unwrap();
        fs::write(temp.path().join("b.htms"), "<i>B</i>").unwrap();
        fs::write(
            temp.path().join("index.html"),
            concat!(
                r#"<IMPORT src="a.htms" as="X"/>"#,
                r#"<div><IMPORT src="b.htms" as="x"/><p><X/></p></div>"#,
                r#"<section><X/></section>"#,
            ),
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            "<div><p><i>B</i></p></div><section><b>A</b></section>"
        );
    }

    #[test]
    fn plain_markup_is_unchanged() {
        let temp = tempdir().unwrap();
        let config = Config::with_root(temp.path());
        let nodes = parse_fragment(r#"<div class="a"><p>text <em>here</em></p></div><!-- c -->"#);

        let mut expander = Expander::new(&config);
        let out = expander
            .expand(nodes.clone(), temp.path(), CallerContext::none(), &AliasTable::new())
            .unwrap();

        assert_eq!(out, nodes);
    }

    #[test]
    fn caller_children_fill_the_slot() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("card.htms"), r#"<div class="card">{{{}}}</div>"#).unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="card.htms" as="CARD"/><CARD><p>one</p><p>two</p></CARD><CARD/>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            r#"<div class="card"><p>one</p><p>two</p></div><div class="card"></div>"#
        );
    }

    #[test]
    fn slotted_children_see_caller_attributes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("card.htms"), r#"<div class="card">{{{}}}</div>"#).unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="card.htms" as="CARD"/><CARD title="T"><p>{{title}}</p></CARD>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            r#"<div class="card"><p>T</p></div>"#
        );
    }

    #[test]
    fn nested_components_see_substituted_attributes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("title.htms"), "<h1>{{text}}</h1>").unwrap();
        fs::write(
            temp.path().join("page.htms"),
            r#"<IMPORT src="title.htms" as="TITLE"/><main><TITLE text="{{heading}}"/>{{{}}}</main>"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="page.htms" as="PAGE"/><PAGE heading="Welcome"><p>body</p></PAGE>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            "<main><h1>Welcome</h1><p>body</p></main>"
        );
    }

    #[test]
    fn missing_component_is_emitted_literally() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="nope.htms" as="NOPE"/><NOPE a="1">kept</NOPE>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "index.html").unwrap(),
            r#"<nope a="1">kept</nope>"#
        );
    }

    #[test]
    fn root_prefixed_sources_resolve_from_project_root() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("components")).unwrap();
        fs::create_dir_all(temp.path().join("blog/posts")).unwrap();
        fs::write(temp.path().join("components/nav.htms"), "<nav>n</nav>").unwrap();
        fs::write(
            temp.path().join("blog/posts/index.html"),
            r#"<IMPORT src="/components/nav.htms" as="NAV"/><NAV/>"#,
        )
        .unwrap();

        assert_eq!(
            build(temp.path(), "blog/posts/index.html").unwrap(),
            "<nav>n</nav>"
        );
    }

    #[test]
    fn relative_sources_resolve_from_the_declaring_file() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("parts")).unwrap();
        fs::write(temp.path().join("parts/outer.htms"), r#"<IMPORT src="inner.htms" as="IN"/><IN/>"#).unwrap();
        fs::write(temp.path().join("parts/inner.htms"), "<span>inner</span>").unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="parts/outer.htms" as="OUT"/><OUT/>"#,
        )
        .unwrap();

        assert_eq!(build(temp.path(), "index.html").unwrap(), "<span>inner</span>");
    }

    #[test]
    fn self_import_is_a_recursion_error() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("loop.htms"), r#"<IMPORT src="loop.htms" as="LOOP"/><LOOP/>"#).unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<IMPORT src="loop.htms" as="LOOP"/><LOOP/>"#,
        )
        .unwrap();

        let result = build(temp.path(), "index.html");

        assert!(matches!(result, Err(LoadError::Recursion { .. })));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("c.htms"), "<i>deep</i>").unwrap();
        fs::write(temp.path().join("b.htms"), r#"<IMPORT src="c.htms" as="C"/><C/>"#).unwrap();
        fs::write(temp.path().join("a.htms"), r#"<IMPORT src="b.htms" as="B"/><B/>"#).unwrap();
        fs::write(temp.path().join("index.html"), r#"<IMPORT src="a.htms" as="A"/><A/>"#).unwrap();

        let mut config = Config::with_root(temp.path());
        config.imports.max_depth = 2;
        let mut expander = Expander::new(&config);
        let result = expander.load(&temp.path().join("index.html"), CallerContext::none(), false);
        assert!(matches!(result, Err(LoadError::DepthExceeded { depth: 2, .. })));

        config.imports.max_depth = 3;
        let mut expander = Expander::new(&config);
        let document: Document = expander
            .load(&temp.path().join("index.html"), CallerContext::none(), false)
            .unwrap();
        assert_eq!(document.to_html().unwrap(), "<i>deep</i>");
    }

    #[test]
    fn custom_import_vocabulary() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("x.htms"), "<u>x</u>").unwrap();
        fs::write(
            temp.path().join("index.html"),
            r#"<use file="x.htms" name="Thing"/><thing/>"#,
        )
        .unwrap();

        let mut config = Config::with_root(temp.path());
        config.imports.tag = "USE".to_string();
        config.imports.source = "file".to_string();
        config.imports.alias = "name".to_string();

        let mut expander = Expander::new(&config);
        let document = expander
            .load(&temp.path().join("index.html"), CallerContext::none(), false)
            .unwrap();

        assert_eq!(document.to_html().unwrap(), "<u>x</u>");
    }

    #[test]
    fn alias_table_is_case_insensitive() {
        let mut table = AliasTable::new();
        table.declare("Header", PathBuf::from("/h.htms"));

        assert_eq!(table.resolve("header"), Some(Path::new("/h.htms")));
        assert_eq!(table.resolve("HEADER"), Some(Path::new("/h.htms")));
        assert_eq!(table.resolve("footer"), None);
        assert_eq!(table.len(), 1);
    }
}
