//! # Actions
//!
//! Everything the host reports becomes an `Action`.
//! User clicks a link? That's `Action::Click(event)`.
//! Back button? That's `Action::PopState`.
//!
//! `update()` is the navigation interceptor: it takes the engine state and
//! an action and returns an `Effect`. It never touches the document and
//! never does I/O. The engine carries out the effect.
//!
//! ```text
//! State + Action  →  update()  →  Effect (Ignore | Transition)
//! ```
//!
//! For clicks, `Effect::Transition` means the host must suppress the
//! browser's default navigation. `Effect::Ignore` means it must not.

use std::fmt;

use url::Url;

use crate::core::config::ResolvedConfig;
use crate::core::request::{Anchor, TransitionOptions, TransitionRequest};
use crate::core::state::EngineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
    Other(u16),
}

impl MouseButton {
    /// Maps a DOM `MouseEvent.button` value.
    pub fn from_dom(button: u16) -> Self {
        match button {
            0 => MouseButton::Primary,
            1 => MouseButton::Auxiliary,
            2 => MouseButton::Secondary,
            other => MouseButton::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// Closest `<a href>` ancestor of the click target, if any.
    pub anchor: Option<Anchor>,
}

impl ClickEvent {
    /// A plain left click on `anchor`.
    pub fn primary(anchor: Anchor) -> Self {
        Self {
            button: MouseButton::Primary,
            modifiers: Modifiers::default(),
            anchor: Some(anchor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click(ClickEvent),
    /// The browser moved through history; the new location is already current.
    PopState,
}

/// Why a navigation was left to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Disabled,
    NoAnchor,
    ModifiedClick,
    CrossOrigin,
    OtherBrowsingContext,
    OptedOut,
    SamePageHash,
    PathUnchanged,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::Disabled => "pjax disabled",
            IgnoreReason::NoAnchor => "no anchor",
            IgnoreReason::ModifiedClick => "modified click",
            IgnoreReason::CrossOrigin => "cross-origin link",
            IgnoreReason::OtherBrowsingContext => "link targets another browsing context",
            IgnoreReason::OptedOut => "link opted out",
            IgnoreReason::SamePageHash => "same-page hash link",
            IgnoreReason::PathUnchanged => "path unchanged",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Ignore(IgnoreReason),
    Transition(TransitionRequest),
}

impl Effect {
    /// Whether the host must call `preventDefault` on the originating event.
    pub fn prevents_default(&self) -> bool {
        matches!(self, Effect::Transition(_))
    }
}

/// The interceptor. `location` is the browser's current location.
pub fn update(
    state: &mut EngineState,
    config: &ResolvedConfig,
    location: &Url,
    action: Action,
) -> Effect {
    match action {
        Action::Click(event) => match check_click(config, location, event) {
            Ok(anchor) => Effect::Transition(TransitionRequest::from_anchor(anchor)),
            Err(reason) => Effect::Ignore(reason),
        },
        Action::PopState => {
            // Initial popstate in some engines and popstate on hash changes
            // leave pathname and query alone.
            if state.path_unchanged(location) {
                return Effect::Ignore(IgnoreReason::PathUnchanged);
            }
            state.remember_path(location);
            Effect::Transition(TransitionRequest::from_location(
                location,
                TransitionOptions {
                    restore_scroll: true,
                    ..Default::default()
                },
            ))
        }
    }
}

fn check_click(
    config: &ResolvedConfig,
    location: &Url,
    event: ClickEvent,
) -> Result<Anchor, IgnoreReason> {
    if config.disabled {
        return Err(IgnoreReason::Disabled);
    }
    let anchor = event.anchor.ok_or(IgnoreReason::NoAnchor)?;

    if event.button != MouseButton::Primary || event.modifiers.any() {
        return Err(IgnoreReason::ModifiedClick);
    }
    if anchor.href.origin() != location.origin() {
        return Err(IgnoreReason::CrossOrigin);
    }
    if anchor.opens_elsewhere() {
        return Err(IgnoreReason::OtherBrowsingContext);
    }
    if anchor.no_pjax {
        return Err(IgnoreReason::OptedOut);
    }

    // Plain in-page jumps are the browser's job unless a fixed header needs
    // compensating for.
    let has_hash = anchor.href.fragment().is_some_and(|f| !f.is_empty());
    if anchor.href.path() == location.path()
        && has_hash
        && config.scroll_offset_selector.is_none()
    {
        return Err(IgnoreReason::SamePageHash);
    }

    Ok(anchor)
}
