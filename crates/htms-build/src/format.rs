//! Output wrapping and pretty-printing.

use std::io;

use htms_core::config::{Config, IndentConfig};
use htms_core::dom::{parse_fragment, to_html, Element, Node};

/// Elements whose content is written exactly as parsed.
const PRESERVE: &[&str] = &["pre", "textarea", "script", "style"];

/// Elements that may sit on the same line as surrounding text.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "del", "dfn", "em",
    "i", "img", "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "select", "small",
    "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

/// Serialize an expanded page. When `format.pretty` is set the page is
/// wrapped in the template prefix and postfix and pretty-printed; otherwise
/// the bare markup is returned.
pub fn finish(nodes: &[Node], config: &Config) -> io::Result<String> {
    let body = to_html(nodes)?;
    if !config.format.pretty {
        return Ok(body);
    }

    let page = format!("{}{}{}", config.template.prefix, body, config.template.postfix);
    prettify(&page, &config.format.indent)
}

/// Re-indent an HTML document: block elements get their own lines, elements
/// holding only text and inline markup stay on one line.
pub fn prettify(html: &str, indent: &IndentConfig) -> io::Result<String> {
    let nodes = parse_fragment(html);
    let mut printer = Printer {
        unit: indent.unit(),
        out: String::with_capacity(html.len() * 2),
    };
    printer.nodes(&nodes, 0)?;
    Ok(printer.out)
}

struct Printer {
    unit: String,
    out: String,
}

impl Printer {
    fn nodes(&mut self, nodes: &[Node], depth: usize) -> io::Result<()> {
        for node in nodes {
            match node {
                Node::Element(element) => self.element(element, depth)?,
                Node::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        self.line(depth, &to_html(&[Node::text(text)])?);
                    }
                }
                other => self.line(depth, &to_html(std::slice::from_ref(other))?),
            }
        }
        Ok(())
    }

    fn element(&mut self, element: &Element, depth: usize) -> io::Result<()> {
        let preserved = PRESERVE.iter().any(|tag| element.is(tag));
        if preserved || element.children.is_empty() || is_inline_content(&element.children) {
            let html = to_html(&[Node::Element(element.clone())])?;
            self.line(depth, &html);
            return Ok(());
        }

        self.line(depth, &open_tag(element)?);
        self.nodes(&element.children, depth + 1)?;
        self.line(depth, &format!("</{}>", element.name));
        Ok(())
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

fn is_inline_content(nodes: &[Node]) -> bool {
    nodes.iter().all(|node| match node {
        Node::Element(element) => {
            INLINE.iter().any(|tag| element.is(tag)) && is_inline_content(&element.children)
        }
        Node::Text(_) | Node::Comment(_) => true,
        Node::Doctype(_) => false,
    })
}

/// The start tag of `element`, attributes escaped by the serializer.
fn open_tag(element: &Element) -> io::Result<String> {
    let shallow = Element {
        name: element.name.clone(),
        attrs: element.attrs.clone(),
        children: Vec::new(),
    };
    let html = to_html(&[Node::Element(shallow)])?;
    let close = format!("</{}>", element.name);

    Ok(match html.strip_suffix(&close) {
        Some(open) => open.to_string(),
        None => html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spaces(width: usize) -> IndentConfig {
        IndentConfig {
            tab_width: width,
            use_tabs: false,
        }
    }

    #[test]
    fn bare_markup_without_pretty_printing() {
        let mut config = Config::default();
        config.format.pretty = false;

        let page = finish(&parse_fragment("<h1>Hi</h1>"), &config).unwrap();

        assert_eq!(page, "<h1>Hi</h1>");
    }

    #[test]
    fn pretty_prints_wrapped_page() {
        let page = finish(&parse_fragment("<h1>Hi</h1>"), &Config::default()).unwrap();

        assert_eq!(page, "<!DOCTYPE html>\n<html>\n    <h1>Hi</h1>\n</html>\n");
    }

    #[test]
    fn blocks_nest_and_inline_content_stays_together() {
        let html = prettify(
            r#"<div class="x"><p>a <b>b</b></p><ul><li>one</li><li>two</li></ul></div>"#,
            &spaces(2),
        )
        .unwrap();

        assert_eq!(
            html,
            concat!(
                "<div class=\"x\">\n",
                "  <p>a <b>b</b></p>\n",
                "  <ul>\n",
                "    <li>one</li>\n",
                "    <li>two</li>\n",
                "  </ul>\n",
                "</div>\n",
            )
        );
    }

    #[test]
    fn preformatted_content_is_verbatim() {
        let html = prettify("<main><pre>  a\n    b</pre><script>if (a<b) {}</script></main>", &spaces(2))
            .unwrap();

        assert_eq!(
            html,
            "<main>\n  <pre>  a\n    b</pre>\n  <script>if (a<b) {}</script>\n</main>\n"
        );
    }

    #[test]
    fn whitespace_between_blocks_is_dropped() {
        let html = prettify("<div>\n   <p>x</p>\n\n</div>", &spaces(4)).unwrap();

        assert_eq!(html, "<div>\n    <p>x</p>\n</div>\n");
    }

    #[test]
    fn indents_with_tabs() {
        let indent = IndentConfig {
            tab_width: 8,
            use_tabs: true,
        };

        let html = prettify("<section><p>x</p></section>", &indent).unwrap();

        assert_eq!(html, "<section>\n\t<p>x</p>\n</section>\n");
    }

    #[test]
    fn void_elements_print_once() {
        let html = prettify(r#"<div><img src="a.png"><p>x</p></div>"#, &spaces(2)).unwrap();

        assert_eq!(html, "<div>\n  <img src=\"a.png\">\n  <p>x</p>\n</div>\n");
    }
}
