//! # Document Model
//!
//! A small owned DOM: just enough structure for the transition engine to
//! reconcile an incoming page with the live one.
//!
//! ```text
//! Document
//! ├── title: String     // <title>, whitespace collapsed
//! ├── head: Element     // kept for completeness, never swapped
//! └── body: Element     // the part a transition replaces
//! ```
//!
//! `Node::Placeholder` never comes out of the parser. The engine puts it
//! where an incoming script used to be, see `core::reconcile`.

pub mod parse;
pub mod select;

use std::fmt;

pub use parse::parse_document;
pub use select::Selector;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Identifies one placeholder inside an incoming body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// Inert marker standing in for a script during a body swap.
    Placeholder(PlaceholderId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_child(Node::Text(text.to_string()))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// All descendant elements in document order, `self` excluded.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_elements(self, &mut out);
        out
    }

    /// First descendant with the given tag name.
    pub fn find_tag(&self, name: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|el| el.is(name))
    }

    /// First descendant with the given id, like `getElementById`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if id.is_empty() {
            return None;
        }
        self.descendants()
            .into_iter()
            .find(|el| el.id() == Some(id))
    }

    /// Position of the element with `id` among all descendants.
    pub fn position_of_id(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.descendants()
            .iter()
            .position(|el| el.id() == Some(id))
    }

    /// Serializes the element and its subtree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub head: Element,
    pub body: Element,
}

impl Document {
    pub fn new(title: &str, body: Element) -> Self {
        Self {
            title: title.to_string(),
            head: Element::new("head"),
            body,
        }
    }

    /// All `<script>` elements of head and body, in document order.
    pub fn scripts(&self) -> Vec<&Element> {
        self.head
            .descendants()
            .into_iter()
            .chain(self.body.descendants())
            .filter(|el| el.is("script"))
            .collect()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<!DOCTYPE html><html>{}{}</html>",
            self.head.to_html(),
            self.body.to_html()
        )
    }
}

/// Collapses runs of ASCII whitespace and trims, like `document.title`.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(el, out),
            Node::Comment(_) | Node::Placeholder(_) => {}
        }
    }
}

fn collect_elements<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &element.children {
        if let Node::Element(el) = child {
            out.push(el);
            collect_elements(el, out);
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value, true));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.name.as_str()) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(el, out),
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape(text, false)),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Node::Placeholder(_) => out.push_str("<script></script>"),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> Element {
        Element::new("body")
            .with_child(Node::Element(
                Element::new("header")
                    .with_attr("id", "top")
                    .with_text("Header"),
            ))
            .with_child(Node::Element(
                Element::new("main").with_attr("id", "main").with_child(Node::Element(
                    Element::new("p").with_attr("class", "lead intro").with_text("Hi & bye"),
                )),
            ))
    }

    #[test]
    fn test_find_by_id_searches_descendants() {
        let body = sample_body();
        assert_eq!(body.find_by_id("main").map(|el| el.name.as_str()), Some("main"));
        assert!(body.find_by_id("missing").is_none());
        assert!(body.find_by_id("").is_none());
    }

    #[test]
    fn test_position_of_id_is_document_order() {
        let body = sample_body();
        assert_eq!(body.position_of_id("top"), Some(0));
        assert_eq!(body.position_of_id("main"), Some(1));
    }

    #[test]
    fn test_attr_lookup_is_case_insensitive() {
        let mut el = Element::new("A").with_attr("HREF", "/x");
        assert!(el.is("a"));
        assert_eq!(el.attr("href"), Some("/x"));
        el.set_attr("href", "/y");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.attr("href"), Some("/y"));
    }

    #[test]
    fn test_has_class_matches_whole_tokens() {
        let body = sample_body();
        let p = body.find_tag("p").unwrap();
        assert!(p.has_class("lead"));
        assert!(p.has_class("intro"));
        assert!(!p.has_class("lea"));
    }

    #[test]
    fn test_to_html_escapes_text_but_not_scripts() {
        let body = Element::new("body")
            .with_child(Node::Element(Element::new("p").with_text("a < b")))
            .with_child(Node::Element(Element::new("script").with_text("if (a < b) {}")))
            .with_child(Node::Element(Element::new("br")));
        assert_eq!(
            body.to_html(),
            "<body><p>a &lt; b</p><script>if (a < b) {}</script><br></body>"
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello \n\t World  "), "Hello World");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
