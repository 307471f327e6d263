//! Build configuration.
//!
//! A [`Config`] is fully populated and immutable for the duration of a build.
//! Partial overrides arrive as [`ConfigPatch`] trees and are folded onto the
//! defaults by the [`ConfigResolver`].

mod patch;
mod resolve;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use htms_markdown::MarkdownOptions;
use regex::{Captures, Regex};
use serde::Deserialize;

pub use patch::{
    ConfigPatch, ExtensionsPatch, FileExtensionsPatch, FilesPatch, FormatPatch, ImportPatch,
    IndentPatch, MarkdownPatch, RenderPatch, TemplatePatch,
};
pub use resolve::{ConfigError, ConfigResolver, OverrideRule};

/// Default placeholder pattern; the first capture group is the variable name.
pub const DEFAULT_PLACEHOLDER: &str = r"\{\{([^{}]+)\}\}";

/// Effective configuration for one source file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub template: TemplateConfig,
    pub format: FormatConfig,
    pub md: MarkdownOptions,
    pub files: FilesConfig,
    pub imports: ImportConfig,
}

impl Config {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.files.root = root.into();
        config
    }
}

/// Template delimiters and the output wrapper.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Prepended to every rendered page
    pub prefix: String,

    /// Appended to every rendered page
    pub postfix: String,

    /// Placeholder pattern used in attribute names, values and text
    pub attribute: Placeholder,

    /// Content slot marker
    pub nesting: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            prefix: "<!DOCTYPE html><html>".to_string(),
            postfix: "</html>".to_string(),
            attribute: Placeholder::default(),
            nesting: "{{{}}}".to_string(),
        }
    }
}

/// A compiled placeholder pattern.
#[derive(Debug, Clone)]
pub struct Placeholder {
    regex: Regex,
}

impl Placeholder {
    /// Compile a placeholder pattern. It must have at least one capture group.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::Placeholder {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        if regex.captures_len() < 2 {
            return Err(ConfigError::Placeholder {
                pattern: pattern.to_string(),
                message: "pattern needs a capture group for the variable name".to_string(),
            });
        }

        Ok(Self { regex })
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Replace every placeholder in `text` with the matching attribute value,
    /// or the empty string when `attrs` has no such attribute.
    pub fn replace<'t>(&self, text: &'t str, attrs: &crate::dom::Attributes) -> Cow<'t, str> {
        self.regex.replace_all(text, |caps: &Captures<'_>| {
            caps.get(1)
                .and_then(|name| attrs.get(name.as_str()))
                .cloned()
                .unwrap_or_default()
        })
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_PLACEHOLDER).expect("Invalid default placeholder pattern"),
        }
    }
}

/// Output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    pub pretty: bool,

    /// Minify compiled stylesheets
    pub minify: bool,

    pub indent: IndentConfig,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            minify: false,
            indent: IndentConfig::default(),
        }
    }
}

/// Pretty-printer indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentConfig {
    pub tab_width: usize,
    pub use_tabs: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            use_tabs: false,
        }
    }
}

impl IndentConfig {
    /// One level of indentation.
    pub fn unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width)
        }
    }
}

/// Terminal action for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Expand, format and write as HTML
    #[serde(alias = "html-template")]
    Html,
    /// Render, wrap in the renderer template and write as HTML
    #[serde(alias = "md")]
    Markdown,
    /// Compile to CSS
    Stylesheet,
    /// Produce no output
    Ignore,
    /// Copy byte-for-byte
    Copy,
}

/// File routing and project layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesConfig {
    pub extensions: FileExtensions,

    /// Explicit extension routes, checked before `extensions`
    pub routes: BTreeMap<String, Route>,

    /// Renderer template looked up next to each Markdown file
    pub md_renderer: String,

    /// Project root for root-relative imports
    pub root: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: FileExtensions::default(),
            routes: BTreeMap::new(),
            md_renderer: "render.htms".to_string(),
            root: PathBuf::from("."),
        }
    }
}

impl FilesConfig {
    /// Route a file by its dotted extension (e.g. `".md"`).
    pub fn route(&self, ext: &str) -> Route {
        let ext = ext.to_lowercase();
        let ext = ext.as_str();

        if let Some(route) = self.routes.get(ext) {
            return *route;
        }

        let matches = |candidate: &str| !ext.is_empty() && candidate.eq_ignore_ascii_case(ext);
        let extensions = &self.extensions;

        if matches(&extensions.html) {
            Route::Html
        } else if matches(&extensions.md) {
            Route::Markdown
        } else if extensions.sass.iter().any(|s| matches(s)) {
            Route::Stylesheet
        } else if extensions.ignore.iter().any(|s| matches(s)) {
            Route::Ignore
        } else {
            Route::Copy
        }
    }

    /// Output path for a routed file: `relative` mirrored under `output_dir`
    /// with the extension swapped where the route changes the file type.
    pub fn output_path(&self, output_dir: &Path, relative: &Path, route: Route) -> PathBuf {
        let target = output_dir.join(relative);
        let ext = match route {
            Route::Markdown => &self.extensions.html,
            Route::Stylesheet => &self.extensions.css,
            _ => return target,
        };
        target.with_extension(ext.trim_start_matches('.'))
    }
}

/// Extension vocabulary for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtensions {
    pub html: String,
    pub md: String,
    pub css: String,
    pub sass: Vec<String>,
    pub ignore: Vec<String>,
}

impl Default for FileExtensions {
    fn default() -> Self {
        Self {
            html: ".html".to_string(),
            md: ".md".to_string(),
            css: ".css".to_string(),
            sass: vec![".scss".to_string(), ".sass".to_string()],
            ignore: vec![".htms".to_string()],
        }
    }
}

/// Import declaration vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Reserved tag name
    pub tag: String,

    /// Attribute holding the file reference
    pub source: String,

    /// Attribute holding the alias
    pub alias: String,

    /// Marks a source as relative to the project root
    pub root_prefix: String,

    /// Maximum component nesting depth
    pub max_depth: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            tag: "IMPORT".to_string(),
            source: "src".to_string(),
            alias: "as".to_string(),
            root_prefix: "/".to_string(),
            max_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attributes;

    #[test]
    fn routes_by_extension() {
        let files = FilesConfig::default();

        assert_eq!(files.route(".html"), Route::Html);
        assert_eq!(files.route(".MD"), Route::Markdown);
        assert_eq!(files.route(".scss"), Route::Stylesheet);
        assert_eq!(files.route(".htms"), Route::Ignore);
        assert_eq!(files.route(".png"), Route::Copy);
        assert_eq!(files.route(""), Route::Copy);
    }

    #[test]
    fn explicit_routes_take_precedence() {
        let mut files = FilesConfig::default();
        files.routes.insert(".html".to_string(), Route::Copy);
        files.routes.insert(".txt".to_string(), Route::Ignore);

        assert_eq!(files.route(".html"), Route::Copy);
        assert_eq!(files.route(".txt"), Route::Ignore);
    }

    #[test]
    fn output_paths_swap_extensions() {
        let files = FilesConfig::default();
        let out = Path::new("/out");

        assert_eq!(
            files.output_path(out, Path::new("blog/a.md"), Route::Markdown),
            PathBuf::from("/out/blog/a.html")
        );
        assert_eq!(
            files.output_path(out, Path::new("style.scss"), Route::Stylesheet),
            PathBuf::from("/out/style.css")
        );
        assert_eq!(
            files.output_path(out, Path::new("img/logo.png"), Route::Copy),
            PathBuf::from("/out/img/logo.png")
        );
    }

    #[test]
    fn placeholder_replaces_every_occurrence() {
        let placeholder = Placeholder::default();
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), "Ada".to_string());

        assert_eq!(placeholder.replace("{{name}}", &attrs), "Ada");
        assert_eq!(
            placeholder.replace("{{name}} and {{name}}", &attrs),
            "Ada and Ada"
        );
        assert_eq!(placeholder.replace("hi {{missing}}!", &attrs), "hi !");
    }

    #[test]
    fn placeholder_requires_capture_group() {
        assert!(matches!(
            Placeholder::new(r"\$\w+"),
            Err(ConfigError::Placeholder { .. })
        ));
        assert!(matches!(
            Placeholder::new("{{("),
            Err(ConfigError::Placeholder { .. })
        ));
        assert!(Placeholder::new(r"\$\{(\w+)\}").is_ok());
    }
}
