//! Forgiving markup parser.
//!
//! Tokenizes with html5ever and builds the tree with a small open-element
//! stack instead of the HTML5 tree construction algorithm: `/>` closes any
//! element, nothing is implicitly wrapped in `html`/`body`, stray end tags are
//! ignored and unclosed elements are closed at end of input.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use super::{Element, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parse markup into a list of top-level nodes.
pub fn parse_fragment(text: &str) -> Vec<Node> {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(text));

    let mut tokenizer = Tokenizer::new(TreeBuilder::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    tokenizer.sink.finish()
}

/// Tokenizer state for elements whose content is not markup.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "textarea" | "title" => Some(RawKind::Rcdata),
        _ => None,
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        self.children_mut().push(node);
    }

    fn append_text(&mut self, text: &str) {
        let children = self.children_mut();
        if let Some(Node::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Node::Text(text.to_string()));
        }
    }

    fn close_current(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    /// Close the nearest open `name` and everything opened after it.
    fn close_until(&mut self, name: &str) {
        if let Some(pos) = self.open.iter().rposition(|el| el.name == name) {
            while self.open.len() > pos {
                self.close_current();
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.open.is_empty() {
            self.close_current();
        }
        self.root
    }
}

impl TokenSink for TreeBuilder {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    let mut element = Element::new(tag.name.to_string());
                    for attr in tag.attrs {
                        element
                            .attrs
                            .entry(attr.name.local.to_string())
                            .or_insert_with(|| attr.value.to_string());
                    }

                    if tag.self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
                        self.append(Node::Element(element));
                        return TokenSinkResult::Continue;
                    }

                    let raw = raw_kind(&element.name);
                    self.open.push(element);
                    if let Some(kind) = raw {
                        return TokenSinkResult::RawData(kind);
                    }
                }
                TagKind::EndTag => self.close_until(&tag.name),
            },
            Token::CharacterTokens(text) => self.append_text(&text),
            Token::CommentToken(text) => self.append(Node::Comment(text.to_string())),
            Token::DoctypeToken(doctype) => {
                let name = doctype
                    .name
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "html".to_string());
                self.append(Node::Doctype(name));
            }
            Token::NullCharacterToken | Token::EOFToken | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}
