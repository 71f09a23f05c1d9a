//! # Headless Host
//!
//! An in-memory `Browser`: a document, a history stack, a scroll position
//! and an animation-frame queue. It backs the command-line driver and the
//! tests.
//!
//! Layout is deliberately crude. Every element in the body is one row of
//! `ROW_HEIGHT` pixels, stacked in document order, so the element at
//! position `n` sits at `n * ROW_HEIGHT`.

use std::collections::BTreeMap;

use log::{debug, info};
use url::Url;

use crate::core::request::Anchor;
use crate::dom::{Document, Element, Node, PlaceholderId, Selector, parse_document};
use crate::host::{Browser, CONTENT_LOADED_EVENT, ComputedBox, FrameCallback, FrameId};

/// Height of one laid-out element.
pub const ROW_HEIGHT: f64 = 40.0;

/// A script the host ran, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedScript {
    pub src: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
    pub title: String,
}

pub struct HeadlessBrowser {
    history: Vec<HistoryEntry>,
    index: usize,
    document: Document,
    scroll: (f64, f64),
    root_style: BTreeMap<String, String>,
    loaded_scripts: Vec<String>,
    executed: Vec<ExecutedScript>,
    events: Vec<String>,
    frames: Vec<(FrameId, FrameCallback)>,
    next_frame: u64,
    reloads: usize,
    pending_reload: bool,
}

impl HeadlessBrowser {
    /// Opens `document` at `url`, running its scripts the way a full page
    /// load does.
    pub fn new(url: Url, document: Document) -> Self {
        let mut browser = Self {
            history: vec![HistoryEntry {
                url,
                title: document.title.clone(),
            }],
            index: 0,
            document: Document::new("", Element::new("body")),
            scroll: (0.0, 0.0),
            root_style: BTreeMap::new(),
            loaded_scripts: Vec::new(),
            executed: Vec::new(),
            events: Vec::new(),
            frames: Vec::new(),
            next_frame: 0,
            reloads: 0,
            pending_reload: false,
        };
        browser.replace_document(document);
        browser
    }

    pub fn load(url: Url, html: &str) -> Self {
        Self::new(url, parse_document(html))
    }

    /// Full page load of `document` at the current history entry: scripts
    /// start from scratch and every one of them runs.
    pub fn replace_document(&mut self, document: Document) {
        self.loaded_scripts.clear();
        self.frames.clear();
        self.scroll = (0.0, 0.0);
        self.pending_reload = false;
        self.history[self.index].title = document.title.clone();

        let scripts: Vec<Element> = document.scripts().into_iter().cloned().collect();
        self.document = document;
        for script in &scripts {
            self.run_script(script);
        }
        self.events.push(CONTENT_LOADED_EVENT.to_string());
        info!(
            "Loaded {} ({} scripts)",
            self.history[self.index].url,
            scripts.len()
        );
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn executed_scripts(&self) -> &[ExecutedScript] {
        &self.executed
    }

    /// Names of the events dispatched so far.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Forgets executed scripts and dispatched events.
    pub fn clear_logs(&mut self) {
        self.executed.clear();
        self.events.clear();
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.history.len()
    }

    /// Moves one entry back. The caller follows up with `Action::PopState`.
    pub fn go_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn go_forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.index += 1;
        true
    }

    /// How many hard reloads were requested.
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// Returns true once per requested hard reload that has not been served.
    pub fn take_pending_reload(&mut self) -> bool {
        std::mem::take(&mut self.pending_reload)
    }

    pub fn root_style(&self, property: &str) -> Option<&str> {
        self.root_style.get(property).map(|v| v.as_str())
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Runs the callbacks queued so far. Callbacks queued while running wait
    /// for the next call.
    pub fn run_frames(&mut self) -> usize {
        let frames = std::mem::take(&mut self.frames);
        let count = frames.len();
        for (id, callback) in frames {
            debug!("Running {}", id);
            callback(&mut *self);
        }
        count
    }

    /// Hyperlinks in the body, resolved against the current location.
    pub fn links(&self) -> Vec<Anchor> {
        let location = self.location();
        self.document
            .body
            .descendants()
            .into_iter()
            .filter_map(|el| Anchor::from_element(el, &location))
            .collect()
    }

    /// First link whose `href` is `href`, either as written or resolved.
    pub fn find_link(&self, href: &str) -> Option<Anchor> {
        let location = self.location();
        let resolved = location.join(href).ok();
        self.document
            .body
            .descendants()
            .into_iter()
            .filter(|el| el.is("a"))
            .find(|el| {
                el.attr("href").map(str::trim) == Some(href)
                    || el
                        .attr("href")
                        .and_then(|h| location.join(h.trim()).ok())
                        .is_some_and(|u| Some(&u) == resolved.as_ref())
            })
            .and_then(|el| Anchor::from_element(el, &location))
    }

    fn run_script(&mut self, script: &Element) {
        let location = self.location();
        let src = script
            .attr("src")
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .and_then(|src| location.join(src).ok())
            .map(|src| src.to_string());

        if let Some(src) = &src
            && !self.loaded_scripts.contains(src)
        {
            self.loaded_scripts.push(src.clone());
        }
        debug!("Running script {}", src.as_deref().unwrap_or("<inline>"));
        self.executed.push(ExecutedScript {
            src,
            text: script.text_content(),
        });
    }
}

impl Browser for HeadlessBrowser {
    fn location(&self) -> Url {
        self.history[self.index].url.clone()
    }

    fn title(&self) -> String {
        self.document.title.clone()
    }

    fn set_title(&mut self, title: &str) {
        self.document.title = title.to_string();
        self.history[self.index].title = title.to_string();
    }

    fn push_state(&mut self, title: &str, url: &Url) {
        self.history.truncate(self.index + 1);
        self.history.push(HistoryEntry {
            url: url.clone(),
            title: title.to_string(),
        });
        self.index += 1;
    }

    fn hard_reload(&mut self) {
        info!("Hard reload of {}", self.location());
        self.reloads += 1;
        self.pending_reload = true;
    }

    fn scroll_position(&self) -> (f64, f64) {
        self.scroll
    }

    fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = (x.max(0.0), y.max(0.0));
    }

    fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll.0 + dx, self.scroll.1 + dy);
    }

    fn has_element(&self, id: &str) -> bool {
        self.document.body.find_by_id(id).is_some()
    }

    fn scroll_into_view(&mut self, id: &str) -> bool {
        match self.document.body.position_of_id(id) {
            Some(position) => {
                self.scroll_to(0.0, position as f64 * ROW_HEIGHT);
                true
            }
            None => false,
        }
    }

    fn computed_box(&self, selector: &str) -> Option<ComputedBox> {
        let element = Selector::parse(selector)?.first_match(&self.document.body)?;
        let mut computed = ComputedBox {
            position: "static".to_string(),
            top: "auto".to_string(),
            height: ROW_HEIGHT,
        };
        for declaration in element.attr("style").unwrap_or("").split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match property.trim().to_ascii_lowercase().as_str() {
                "position" => computed.position = value.to_ascii_lowercase(),
                "top" => computed.top = value.to_string(),
                "height" => {
                    if let Ok(px) = value.trim_end_matches("px").trim().parse::<f64>() {
                        computed.height = px;
                    }
                }
                _ => {}
            }
        }
        Some(computed)
    }

    fn loaded_script_sources(&self) -> Vec<String> {
        self.loaded_scripts.clone()
    }

    fn install_body(&mut self, body: Element) {
        self.document.body = body;
    }

    fn resolve_placeholder(&mut self, id: PlaceholderId, script: Option<Element>) -> bool {
        let mut replacement = script.clone();
        if !replace_placeholder(&mut self.document.body, id, &mut replacement) {
            return false;
        }
        if let Some(script) = &script {
            self.run_script(script);
        }
        true
    }

    fn set_root_style(&mut self, property: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.root_style
                    .insert(property.to_string(), value.to_string());
            }
            None => {
                self.root_style.remove(property);
            }
        }
    }

    fn dispatch_event(&mut self, name: &str) {
        debug!("Event {}", name);
        self.events.push(name.to_string());
    }

    fn request_animation_frame(&mut self, callback: FrameCallback) -> FrameId {
        let id = FrameId(self.next_frame);
        self.next_frame += 1;
        self.frames.push((id, callback));
        id
    }

    fn cancel_animation_frame(&mut self, id: FrameId) {
        self.frames.retain(|(queued, _)| *queued != id);
    }
}

/// Puts `replacement` where the placeholder sits, or removes the
/// placeholder when there is nothing to put there.
fn replace_placeholder(
    root: &mut Element,
    id: PlaceholderId,
    replacement: &mut Option<Element>,
) -> bool {
    let position = root
        .children
        .iter()
        .position(|child| *child == Node::Placeholder(id));
    if let Some(position) = position {
        match replacement.take() {
            Some(script) => root.children[position] = Node::Element(script),
            None => {
                root.children.remove(position);
            }
        }
        return true;
    }

    root.children.iter_mut().any(|child| match child {
        Node::Element(el) => replace_placeholder(el, id, replacement),
        _ => false,
    })
}
