//! Scroll handling around a transition.
//!
//! Scrolling happens twice: once before the body swap and once after it.
//! Some engines make fixed-position elements jitter when the only scroll
//! happens after the swap; scrolling on both sides makes that rarer, it does
//! not remove it.

use url::Url;

use crate::core::config::ResolvedConfig;
use crate::core::request::{TransitionRequest, fragment_id};
use crate::host::Browser;

/// Where the page should end up after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    /// Element id to bring into view.
    pub target_id: Option<String>,
    /// Leave the scroll position alone when there is no target.
    pub no_scroll: bool,
}

impl ScrollPlan {
    /// Resolves the target for `request` landing on `location`: the location
    /// hash wins, then (push only) the anchor's `data-scroll-to-id`, where an
    /// empty value falls back to `default_main_id`.
    pub fn resolve(request: &TransitionRequest, location: &Url, config: &ResolvedConfig) -> Self {
        let options = request.options();
        let mut target_id = fragment_id(location);

        if target_id.is_none()
            && request.is_push()
            && let Some(id) = &options.scroll_to_id
        {
            target_id = if id.is_empty() {
                config.default_main_id.clone()
            } else {
                Some(id.clone())
            };
        }

        Self {
            target_id,
            no_scroll: options.no_scroll,
        }
    }

    /// First pass, on the outgoing document.
    pub fn apply_before_swap(&self, browser: &mut dyn Browser, offset_selector: Option<&str>) {
        match &self.target_id {
            Some(id) => {
                if browser.scroll_into_view(id) {
                    offset_scroll(browser, offset_selector);
                }
            }
            None if !self.no_scroll => browser.scroll_to(0.0, 0.0),
            None => {}
        }
    }

    /// Second pass, on the incoming document. Scrolling to a target is
    /// deferred to the next frame so freshly run scripts can change the
    /// layout first.
    pub fn apply_after_swap(&self, browser: &mut dyn Browser, offset_selector: Option<&str>) {
        let target = self.target_id.as_ref().filter(|id| browser.has_element(id));

        match target {
            Some(id) => {
                let id = id.clone();
                let selector = offset_selector.map(|s| s.to_string());
                browser.request_animation_frame(Box::new(move |browser: &mut dyn Browser| {
                    if browser.scroll_into_view(&id) {
                        offset_scroll(browser, selector.as_deref());
                    }
                }));
            }
            None if !self.no_scroll => browser.scroll_to(0.0, 0.0),
            None => {}
        }
    }
}

/// Pulls the view down by the height of a header pinned to the top of the
/// viewport, so it does not cover the element just scrolled to.
pub fn offset_scroll(browser: &mut dyn Browser, selector: Option<&str>) {
    let Some(selector) = selector.filter(|s| !s.is_empty()) else {
        return;
    };
    if let Some(header) = browser.computed_box(selector)
        && header.is_fixed_to_top()
    {
        browser.scroll_by(0.0, -header.height);
    }
}
