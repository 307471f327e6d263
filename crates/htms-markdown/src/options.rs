//! Renderer options and extension toggles.

/// Core rendering switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pass raw HTML in the source through to the output
    pub html: bool,

    /// Emit XHTML-style void tags (`<br />`)
    pub xhtml_out: bool,

    /// Render soft line breaks as `<br />`
    pub breaks: bool,

    /// Class prefix for fenced code block languages
    pub lang_prefix: String,

    /// Turn bare URLs into links
    pub linkify: bool,

    /// Smart quotes and dashes
    pub typographer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html: true,
            xhtml_out: true,
            breaks: true,
            lang_prefix: "language-".to_string(),
            linkify: true,
            typographer: true,
        }
    }
}

/// Individually toggleable syntax extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnote: bool,
    pub deflist: bool,
    /// `{#id .class}` attributes on headings
    pub attrs: bool,
    /// `$inline$` and `$$display$$` math
    pub katex: bool,

    // Accepted for compatibility; the renderer has no support for these.
    pub sub: bool,
    pub sup: bool,
    pub abbr: bool,
    pub emoji: bool,
    pub container: bool,
    pub ins: bool,
    pub mark: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: false,
            footnote: false,
            deflist: false,
            attrs: false,
            katex: false,
            sub: false,
            sup: false,
            abbr: false,
            emoji: false,
            container: false,
            ins: false,
            mark: false,
        }
    }
}

impl Extensions {
    /// Names of enabled extensions the renderer cannot honor.
    pub fn unsupported(&self) -> Vec<&'static str> {
        [
            ("sub", self.sub),
            ("sup", self.sup),
            ("abbr", self.abbr),
            ("emoji", self.emoji),
            ("container", self.container),
            ("ins", self.ins),
            ("mark", self.mark),
        ]
        .into_iter()
        .filter_map(|(name, enabled)| enabled.then_some(name))
        .collect()
    }
}

/// Complete Markdown configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub config: RenderOptions,
    pub extensions: Extensions,
}
