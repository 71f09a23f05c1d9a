//! Minimal CSS selector matching for the headless host.
//!
//! Supports selector lists of compound selectors: a tag name, `#id`,
//! `.class` and `[attr]` parts, e.g. `header.site-nav, #top`. Combinators
//! are not supported; a selector using them never matches.

use super::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
}

impl Selector {
    /// Returns `None` for an empty or unsupported selector.
    pub fn parse(input: &str) -> Option<Self> {
        let alternatives = input
            .split(',')
            .map(|part| parse_compound(part.trim()))
            .collect::<Option<Vec<_>>>()?;
        if alternatives.is_empty() {
            return None;
        }
        Some(Self { alternatives })
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }

    /// First descendant of `root` matching the selector, like `querySelector`.
    pub fn first_match<'a>(&self, root: &'a Element) -> Option<&'a Element> {
        root.descendants().into_iter().find(|el| self.matches(el))
    }
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag
            && !element.is(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id() != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|c| element.has_class(c))
            && self.attrs.iter().all(|a| element.has_attr(a))
    }
}

fn parse_compound(input: &str) -> Option<Compound> {
    if input.is_empty() || input.contains(|c: char| c.is_whitespace() || "+>~:".contains(c)) {
        return None;
    }

    let mut compound = Compound::default();
    let mut rest = input;

    let tag_len = rest
        .find(|c: char| c == '#' || c == '.' || c == '[')
        .unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];
    }

    while let Some(marker) = rest.chars().next() {
        rest = &rest[1..];
        if marker == '[' {
            let end = rest.find(']')?;
            let name = rest[..end].trim();
            if name.is_empty() || name.contains('=') {
                return None;
            }
            compound.attrs.push(name.to_ascii_lowercase());
            rest = &rest[end + 1..];
            continue;
        }

        let end = rest
            .find(|c: char| c == '#' || c == '.' || c == '[')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        if name.is_empty() {
            return None;
        }
        match marker {
            '#' => compound.id = Some(name.to_string()),
            '.' => compound.classes.push(name.to_string()),
            _ => return None,
        }
        rest = &rest[end..];
    }

    Some(compound)
}
