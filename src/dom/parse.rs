//! HTML → `Document` conversion.
//!
//! Parsing goes through `scraper` (html5ever underneath), so malformed
//! markup is recovered the same way a browser recovers it: a `<head>` and a
//! `<body>` always exist afterwards.

use scraper::{ElementRef, Html};

use super::{Document, Element, Node, collapse_whitespace};

/// Parses a complete HTML page.
pub fn parse_document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let root = convert_element(parsed.root_element());

    let mut head = None;
    let mut body = None;
    for child in root.children.iter() {
        if let Node::Element(el) = child {
            if el.is("head") && head.is_none() {
                head = Some(el.clone());
            } else if el.is("body") && body.is_none() {
                body = Some(el.clone());
            }
        }
    }

    let title = root
        .find_tag("title")
        .map(|el| collapse_whitespace(&el.text_content()))
        .unwrap_or_default();

    Document {
        title,
        head: head.unwrap_or_else(|| Element::new("head")),
        body: body.unwrap_or_else(|| Element::new("body")),
    }
}

fn convert_element(element: ElementRef<'_>) -> Element {
    let value = element.value();
    let mut out = Element::new(value.name());
    for (key, val) in value.attrs() {
        out.attrs.push((key.to_string(), val.to_string()));
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            out.children.push(Node::Element(convert_element(child_element)));
            continue;
        }
        match child.value() {
            scraper::Node::Text(text) => out.children.push(Node::Text(text.text.to_string())),
            scraper::Node::Comment(comment) => {
                out.children.push(Node::Comment(comment.comment.to_string()))
            }
            _ => {}
        }
    }

    out
}
