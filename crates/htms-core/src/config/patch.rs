//! Partial configuration trees.
//!
//! Every field is optional. Applying a patch overwrites the scalars it sets,
//! recurses into the nested patches it carries, replaces lists wholesale and
//! merges `files.routes` key by key.

use std::collections::BTreeMap;
use std::path::PathBuf;

use htms_markdown::{Extensions, MarkdownOptions, RenderOptions};
use serde::Deserialize;

use super::{
    Config, ConfigError, FileExtensions, FilesConfig, FormatConfig, ImportConfig, IndentConfig,
    Placeholder, Route, TemplateConfig,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub template: Option<TemplatePatch>,
    pub format: Option<FormatPatch>,
    pub md: Option<MarkdownPatch>,
    pub files: Option<FilesPatch>,
    pub imports: Option<ImportPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    pub attribute: Option<String>,
    pub nesting: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatPatch {
    pub pretty: Option<bool>,
    pub minify: Option<bool>,
    #[serde(rename = "prettierConfig")]
    pub prettier_config: Option<IndentPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndentPatch {
    pub tab_width: Option<usize>,
    pub use_tabs: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkdownPatch {
    pub config: Option<RenderPatch>,
    pub extensions: Option<ExtensionsPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPatch {
    pub html: Option<bool>,
    pub xhtml_out: Option<bool>,
    pub breaks: Option<bool>,
    pub lang_prefix: Option<String>,
    pub linkify: Option<bool>,
    pub typographer: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionsPatch {
    pub tables: Option<bool>,
    pub strikethrough: Option<bool>,
    pub tasklists: Option<bool>,
    pub footnote: Option<bool>,
    pub deflist: Option<bool>,
    pub attrs: Option<bool>,
    pub katex: Option<bool>,
    pub sub: Option<bool>,
    pub sup: Option<bool>,
    pub abbr: Option<bool>,
    pub emoji: Option<bool>,
    pub container: Option<bool>,
    pub ins: Option<bool>,
    pub mark: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesPatch {
    pub extensions: Option<FileExtensionsPatch>,
    pub routes: Option<BTreeMap<String, Route>>,
    pub md_renderer: Option<String>,
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileExtensionsPatch {
    pub html: Option<String>,
    pub md: Option<String>,
    pub css: Option<String>,
    pub sass: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportPatch {
    pub tag: Option<String>,
    pub source: Option<String>,
    pub alias: Option<String>,
    pub root_prefix: Option<String>,
    pub max_depth: Option<usize>,
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

impl Config {
    /// Merge `patch` on top of this configuration.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        if let Some(template) = &patch.template {
            self.template.apply(template)?;
        }
        if let Some(format) = &patch.format {
            self.format.apply(format);
        }
        if let Some(md) = &patch.md {
            apply_markdown(&mut self.md, md);
        }
        if let Some(files) = &patch.files {
            self.files.apply(files);
        }
        if let Some(imports) = &patch.imports {
            self.imports.apply(imports);
        }
        Ok(())
    }
}

impl TemplateConfig {
    fn apply(&mut self, patch: &TemplatePatch) -> Result<(), ConfigError> {
        set(&mut self.prefix, &patch.prefix);
        set(&mut self.postfix, &patch.postfix);
        set(&mut self.nesting, &patch.nesting);
        if let Some(pattern) = &patch.attribute {
            self.attribute = Placeholder::new(pattern)?;
        }
        Ok(())
    }
}

impl FormatConfig {
    fn apply(&mut self, patch: &FormatPatch) {
        set(&mut self.pretty, &patch.pretty);
        set(&mut self.minify, &patch.minify);
        if let Some(indent) = &patch.prettier_config {
            self.indent.apply(indent);
        }
    }
}

impl IndentConfig {
    fn apply(&mut self, patch: &IndentPatch) {
        set(&mut self.tab_width, &patch.tab_width);
        set(&mut self.use_tabs, &patch.use_tabs);
    }
}

fn apply_markdown(md: &mut MarkdownOptions, patch: &MarkdownPatch) {
    if let Some(config) = &patch.config {
        apply_render(&mut md.config, config);
    }
    if let Some(extensions) = &patch.extensions {
        apply_extensions(&mut md.extensions, extensions);
    }
}

fn apply_render(render: &mut RenderOptions, patch: &RenderPatch) {
    set(&mut render.html, &patch.html);
    set(&mut render.xhtml_out, &patch.xhtml_out);
    set(&mut render.breaks, &patch.breaks);
    set(&mut render.lang_prefix, &patch.lang_prefix);
    set(&mut render.linkify, &patch.linkify);
    set(&mut render.typographer, &patch.typographer);
}

fn apply_extensions(ext: &mut Extensions, patch: &ExtensionsPatch) {
    set(&mut ext.tables, &patch.tables);
    set(&mut ext.strikethrough, &patch.strikethrough);
    set(&mut ext.tasklists, &patch.tasklists);
    set(&mut ext.footnote, &patch.footnote);
    set(&mut ext.deflist, &patch.deflist);
    set(&mut ext.attrs, &patch.attrs);
    set(&mut ext.katex, &patch.katex);
    set(&mut ext.sub, &patch.sub);
    set(&mut ext.sup, &patch.sup);
    set(&mut ext.abbr, &patch.abbr);
    set(&mut ext.emoji, &patch.emoji);
    set(&mut ext.container, &patch.container);
    set(&mut ext.ins, &patch.ins);
    set(&mut ext.mark, &patch.mark);
}

impl FilesConfig {
    fn apply(&mut self, patch: &FilesPatch) {
        if let Some(extensions) = &patch.extensions {
            self.extensions.apply(extensions);
        }
        if let Some(routes) = &patch.routes {
            for (ext, route) in routes {
                self.routes.insert(ext.to_lowercase(), *route);
            }
        }
        set(&mut self.md_renderer, &patch.md_renderer);
        set(&mut self.root, &patch.root);
    }
}

impl FileExtensions {
    fn apply(&mut self, patch: &FileExtensionsPatch) {
        set(&mut self.html, &patch.html);
        set(&mut self.md, &patch.md);
        set(&mut self.css, &patch.css);
        set(&mut self.sass, &patch.sass);
        set(&mut self.ignore, &patch.ignore);
    }
}

impl ImportConfig {
    fn apply(&mut self, patch: &ImportPatch) {
        set(&mut self.tag, &patch.tag);
        set(&mut self.source, &patch.source);
        set(&mut self.alias, &patch.alias);
        set(&mut self.root_prefix, &patch.root_prefix);
        set(&mut self.max_depth, &patch.max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn patch(json: &str) -> ConfigPatch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn merge_keeps_untouched_defaults() {
        let mut config = Config::default();
        config.apply(&patch(r#"{"format": {"pretty": false}}"#)).unwrap();

        assert!(!config.format.pretty);
        assert_eq!(config.imports, ImportConfig::default());
        assert_eq!(config.imports.tag, "IMPORT");
        assert_eq!(config.format.indent, IndentConfig::default());
        assert_eq!(config.template.nesting, "{{{}}}");
    }

    #[test]
    fn later_patches_win_per_leaf() {
        let mut config = Config::default();
        config
            .apply(&patch(
                r#"{"format": {"prettierConfig": {"tabWidth": 2, "useTabs": true}}}"#,
            ))
            .unwrap();
        config
            .apply(&patch(r#"{"format": {"prettierConfig": {"useTabs": false}}}"#))
            .unwrap();

        assert_eq!(config.format.indent.tab_width, 2);
        assert!(!config.format.indent.use_tabs);
    }

    #[test]
    fn lists_replace_and_routes_merge() {
        let mut config = Config::default();
        config
            .apply(&patch(
                r#"{"files": {"extensions": {"ignore": [".tmp"]}, "routes": {".TXT": "ignore"}}}"#,
            ))
            .unwrap();
        config
            .apply(&patch(r#"{"files": {"routes": {".svg": "copy"}}}"#))
            .unwrap();

        assert_eq!(config.files.extensions.ignore, vec![".tmp".to_string()]);
        assert_eq!(config.files.routes.get(".txt"), Some(&Route::Ignore));
        assert_eq!(config.files.routes.get(".svg"), Some(&Route::Copy));
        assert_eq!(config.files.route(".htms"), Route::Copy);
    }

    #[test]
    fn markdown_keys_use_original_casing() {
        let mut config = Config::default();
        config
            .apply(&patch(
                r#"{"md": {"config": {"langPrefix": "lang-", "xhtmlOut": false}, "extensions": {"footnote": true}}}"#,
            ))
            .unwrap();

        assert_eq!(config.md.config.lang_prefix, "lang-");
        assert!(!config.md.config.xhtml_out);
        assert!(config.md.extensions.footnote);
        assert!(config.md.extensions.tables);
    }

    #[test]
    fn invalid_placeholder_is_rejected() {
        let mut config = Config::default();
        let result = config.apply(&patch(r#"{"template": {"attribute": "(unclosed"}}"#));

        assert!(matches!(result, Err(ConfigError::Placeholder { .. })));
    }
}
