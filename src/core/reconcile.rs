//! # Document Reconciliation
//!
//! Installs an incoming document into the live one:
//!
//! 1. copy the title;
//! 2. drop incoming `<script src>` elements the live page already loaded;
//! 3. swap every remaining incoming script for a `Node::Placeholder`;
//! 4. install the body (nothing in it can execute now);
//! 5. put a fresh copy of each script where its placeholder sits, which is
//!    what makes it run, or drop the placeholder for scripts that would
//!    wipe the live document.
//!
//! Engines disagree on whether scripts inside a body assigned with
//! `document.body = ...` execute. Going through placeholders makes every
//! host behave the same way.

use std::collections::HashSet;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use url::Url;

use crate::dom::{Document, Element, Node, PlaceholderId};
use crate::host::Browser;

/// Calls that erase the live document when run after load, such as the
/// snippet some dev servers inject. Textual and best-effort: a match only
/// means "do not re-run this", it is not a security boundary.
static DESTROYS_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"document\s*\.\s*(?:write|open)\s*\(").expect("static regex")
});

/// Attributes carried over to the fresh copy of a script.
const COPIED_SCRIPT_ATTRS: &[&str] = &["id", "src", "async", "defer", "type", "charset"];

/// A placeholder and the script it stands in for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPair {
    pub placeholder: PlaceholderId,
    pub script: Element,
}

/// What happened to the incoming scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub already_loaded: usize,
    pub executed: usize,
    pub skipped_unsafe: usize,
    pub detached: usize,
}

/// Best-effort check for `document.write(` / `document.open(` in inline code.
pub fn destroys_document(script_text: &str) -> bool {
    DESTROYS_DOCUMENT.is_match(script_text)
}

/// Replaces the live title and body with `incoming`'s.
///
/// `document_url` is the URL the incoming document was served from; it is
/// the base for resolving script `src` attributes.
pub fn install_document(
    browser: &mut dyn Browser,
    mut incoming: Document,
    document_url: &Url,
) -> ScriptReport {
    browser.set_title(&incoming.title);

    let loaded: HashSet<String> = browser.loaded_script_sources().into_iter().collect();
    let mut report = ScriptReport {
        already_loaded: remove_known_scripts(&mut incoming.body, &loaded, document_url),
        ..Default::default()
    };

    let mut next_id = 0;
    let pairs = replace_scripts_with_placeholders(&mut incoming.body, &mut next_id);
    debug!(
        "Body swap: {} known scripts dropped, {} placeholders",
        report.already_loaded,
        pairs.len()
    );

    browser.install_body(incoming.body);

    for pair in pairs {
        let script = if destroys_document(&pair.script.text_content()) {
            warn!(
                "Not re-running script {:?}: it calls document.write/open",
                pair.script.id().unwrap_or("<anonymous>")
            );
            report.skipped_unsafe += 1;
            None
        } else {
            Some(copy_script(&pair.script))
        };

        let executes = script.is_some();
        if !browser.resolve_placeholder(pair.placeholder, script) {
            report.detached += 1;
        } else if executes {
            report.executed += 1;
        }
    }

    report
}

/// Removes `<script src>` descendants whose resolved `src` is in `loaded`.
/// Returns how many were removed.
pub fn remove_known_scripts(root: &mut Element, loaded: &HashSet<String>, base: &Url) -> usize {
    let before = root.children.len();
    root.children.retain(|child| match child {
        Node::Element(el) if el.is("script") => !is_loaded(el, loaded, base),
        _ => true,
    });
    let mut removed = before - root.children.len();

    for child in root.children.iter_mut() {
        if let Node::Element(el) = child {
            removed += remove_known_scripts(el, loaded, base);
        }
    }
    removed
}

fn is_loaded(script: &Element, loaded: &HashSet<String>, base: &Url) -> bool {
    script
        .attr("src")
        .filter(|src| !src.trim().is_empty())
        .and_then(|src| base.join(src.trim()).ok())
        .is_some_and(|src| loaded.contains(src.as_str()))
}

/// Swaps every script under `root` for a placeholder, in document order.
pub fn replace_scripts_with_placeholders(
    root: &mut Element,
    next_id: &mut usize,
) -> Vec<ReconciliationPair> {
    let mut pairs = Vec::new();
    for child in root.children.iter_mut() {
        if matches!(child, Node::Element(el) if el.is("script")) {
            let placeholder = PlaceholderId(*next_id);
            *next_id += 1;
            if let Node::Element(script) = std::mem::replace(child, Node::Placeholder(placeholder)) {
                pairs.push(ReconciliationPair {
                    placeholder,
                    script,
                });
            }
        } else if let Node::Element(el) = child {
            pairs.extend(replace_scripts_with_placeholders(el, next_id));
        }
    }
    pairs
}

/// A fresh script element with the original's identity, loading
/// attributes and inline code.
pub fn copy_script(original: &Element) -> Element {
    let mut copy = Element::new("script");
    for name in COPIED_SCRIPT_ATTRS {
        if let Some(value) = original.attr(name) {
            copy.set_attr(name, value);
        }
    }
    let text = original.text_content();
    if !text.is_empty() {
        copy.children.push(Node::Text(text));
    }
    copy
}
