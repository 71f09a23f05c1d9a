//! Loading indication for slow transitions.
//!
//! `start` runs only when a fetch outlives `load_indicator_delay`; `end`
//! runs after every successful swap and must undo whatever `start` did.

use crate::host::Browser;

pub trait LoadIndicator: Send + Sync {
    fn start(&self, browser: &mut dyn Browser);

    fn end(&self, browser: &mut dyn Browser);
}

/// Dims the whole page while a slow transition is pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct FadeIndicator;

impl LoadIndicator for FadeIndicator {
    fn start(&self, browser: &mut dyn Browser) {
        browser.set_root_style("transition", Some("opacity linear 0.05s"));
        browser.set_root_style("opacity", Some("0.8"));
    }

    fn end(&self, browser: &mut dyn Browser) {
        browser.set_root_style("transition", None);
        browser.set_root_style("opacity", None);
    }
}
