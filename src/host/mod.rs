//! # Host Surface
//!
//! Everything the engine needs from the environment it runs in. A real
//! browser binding implements `Browser` over the live DOM; the crate ships
//! `HeadlessBrowser` as an in-memory host.
//!
//! ```text
//!          ┌──────────────┐   Fetcher::fetch   ┌──────────────┐
//!          │     Pjax     │ ─────────────────▶ │ HttpFetcher  │
//!          │   (engine)   │                    └──────────────┘
//!          └──────┬───────┘
//!                 │ Browser::*
//!                 ▼
//!          ┌──────────────┐
//!          │ live document│  title, body, history, scroll, frames
//!          └──────────────┘
//! ```
//!
//! All `Browser` methods are synchronous: the host is a single UI thread and
//! the only suspension points are the fetch and animation-frame callbacks.

pub mod fetch;
pub mod http;

use std::fmt;

use url::Url;

use crate::dom::{Element, PlaceholderId};

pub use fetch::{FetchError, FetchResponse, Fetcher};
pub use http::HttpFetcher;

/// Dispatched on the document right before the old body is swapped out.
pub const BEFORE_TRANSITION_EVENT: &str = "simple-pjax-before-transition";
/// Dispatched on the document right after the new body is installed.
pub const AFTER_TRANSITION_EVENT: &str = "simple-pjax-after-transition";
/// Re-dispatched after every transition so page scripts can reinitialize.
pub const CONTENT_LOADED_EVENT: &str = "DOMContentLoaded";

/// Handle for a pending animation-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Work deferred to the next paint frame.
pub type FrameCallback = Box<dyn FnOnce(&mut dyn Browser) + Send>;

/// The subset of computed style the scroll-offset check reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedBox {
    pub position: String,
    pub top: String,
    pub height: f64,
}

impl ComputedBox {
    /// True for a header pinned flush to the top of the viewport.
    pub fn is_fixed_to_top(&self) -> bool {
        self.position == "fixed" && self.top == "0px"
    }
}

pub trait Browser: Send {
    /// Current location, including the fragment.
    fn location(&self) -> Url;

    fn title(&self) -> String;

    fn set_title(&mut self, title: &str);

    /// Adds a history entry and moves the location to `url`.
    fn push_state(&mut self, title: &str, url: &Url);

    /// Full page reload of the current location.
    fn hard_reload(&mut self);

    fn scroll_position(&self) -> (f64, f64);

    fn scroll_to(&mut self, x: f64, y: f64);

    fn scroll_by(&mut self, dx: f64, dy: f64);

    /// Whether the live document has an element with this id.
    fn has_element(&self, id: &str) -> bool;

    /// Scrolls the element with `id` into view. Returns false if the live
    /// document has no such element.
    fn scroll_into_view(&mut self, id: &str) -> bool;

    /// Computed box of the first element matching `selector`.
    fn computed_box(&self, selector: &str) -> Option<ComputedBox>;

    /// Absolute `src` URLs of the scripts the live document already loaded.
    fn loaded_script_sources(&self) -> Vec<String>;

    /// Replaces the live body. Scripts inside `body` must not run.
    fn install_body(&mut self, body: Element);

    /// Substitutes `script` for the placeholder, running it, or drops the
    /// placeholder when `script` is `None`. Returns false if the placeholder
    /// is no longer attached to the document.
    fn resolve_placeholder(&mut self, id: PlaceholderId, script: Option<Element>) -> bool;

    /// Sets (or clears, with `None`) an inline style on the root element.
    fn set_root_style(&mut self, property: &str, value: Option<&str>);

    fn dispatch_event(&mut self, name: &str);

    fn request_animation_frame(&mut self, callback: FrameCallback) -> FrameId;

    fn cancel_animation_frame(&mut self, id: FrameId);
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}
