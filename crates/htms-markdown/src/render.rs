//! Markdown to HTML rendering.

use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};

use crate::options::MarkdownOptions;

/// A configured Markdown renderer.
///
/// Holds no per-document state, so one instance can render any number of
/// sources.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    html: bool,
    xhtml_out: bool,
    breaks: bool,
    linkify: bool,
    lang_prefix: String,
}

impl MarkdownRenderer {
    /// Create a renderer from the given options.
    pub fn new(opts: &MarkdownOptions) -> Self {
        let ext = &opts.extensions;
        let mut options = Options::empty();

        if ext.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if ext.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if ext.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if ext.footnote {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if ext.deflist {
            options.insert(Options::ENABLE_DEFINITION_LIST);
        }
        if ext.attrs {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        if ext.katex {
            options.insert(Options::ENABLE_MATH);
        }
        if opts.config.typographer {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }

        for name in ext.unsupported() {
            tracing::debug!("Markdown extension '{}' is not supported, ignoring", name);
        }

        Self {
            options,
            html: opts.config.html,
            xhtml_out: opts.config.xhtml_out,
            breaks: opts.config.breaks,
            linkify: opts.config.linkify,
            lang_prefix: opts.config.lang_prefix.clone(),
        }
    }

    /// Render Markdown source to an HTML string.
    pub fn render(&self, source: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(source, self.options));

        let mut events = Vec::new();
        // Depth of links, images and code blocks, whose text is never linkified.
        let mut opaque = 0usize;
        for event in parser {
            match &event {
                Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => {
                    opaque += 1
                }
                Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                    opaque = opaque.saturating_sub(1)
                }
                _ => {}
            }

            match event {
                Event::Text(text) if self.linkify && opaque == 0 => autolink(&text, &mut events),
                other => events.push(self.rewrite(other)),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        html_output
    }

    /// Apply the renderer switches pulldown-cmark has no option for.
    fn rewrite<'a>(&self, event: Event<'a>) -> Event<'a> {
        match event {
            Event::Html(raw) | Event::InlineHtml(raw) if !self.html => Event::Text(raw),
            Event::SoftBreak if self.breaks => self.hard_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule if !self.xhtml_out => Event::Html(CowStr::Borrowed("<hr>\n")),
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let lang = info.split_whitespace().next().map(sanitize_lang);
                match lang {
                    Some(lang) if !lang.is_empty() => Event::Html(CowStr::from(format!(
                        "<pre><code class=\"{}{}\">",
                        self.lang_prefix, lang
                    ))),
                    _ => Event::Html(CowStr::Borrowed("<pre><code>")),
                }
            }
            other => other,
        }
    }

    fn hard_break<'a>(&self) -> Event<'a> {
        if self.xhtml_out {
            Event::HardBreak
        } else {
            Event::Html(CowStr::Borrowed("<br>\n"))
        }
    }
}

/// Split `text` around bare URLs and email addresses, wrapping each in a link.
fn autolink<'a>(text: &str, events: &mut Vec<Event<'a>>) {
    let mut finder = LinkFinder::new();
    finder.url_must_have_scheme(false);

    for span in finder.spans(text) {
        let label = span.as_str().to_string();
        let href = match span.kind() {
            Some(LinkKind::Email) => format!("mailto:{}", label),
            Some(_) if label.contains("://") => label.clone(),
            // Bare host names only link when they look like one (`www.`).
            Some(_) if label.starts_with("www.") => format!("http://{}", label),
            _ => {
                events.push(Event::Text(CowStr::from(label)));
                continue;
            }
        };

        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(label)));
        events.push(Event::End(TagEnd::Link));
    }
}

/// Keep only characters that are safe inside a class attribute.
fn sanitize_lang(lang: &str) -> String {
    lang.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '.' | '#'))
        .collect()
}
