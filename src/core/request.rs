//! # Transition Requests
//!
//! One `TransitionRequest` describes one navigation attempt. It is built by
//! the interceptor (or by `Pjax::reload`) and handed to the engine, which
//! only reads it.
//!
//! Link behaviour is tuned with data attributes on the anchor:
//!
//! | Attribute            | Effect                                          |
//! |----------------------|-------------------------------------------------|
//! | `data-no-pjax`       | never intercept this link                       |
//! | `data-noscroll`      | keep the scroll position on arrival             |
//! | `data-force-reload`  | transition even when the URL is unchanged       |
//! | `data-scroll-to-id`  | scroll to this id (empty: the default main id)  |

use percent_encoding::percent_decode_str;
use url::Url;

use crate::dom::Element;

pub const NO_PJAX_ATTR: &str = "data-no-pjax";
pub const NO_SCROLL_ATTR: &str = "data-noscroll";
pub const FORCE_RELOAD_ATTR: &str = "data-force-reload";
pub const SCROLL_TO_ID_ATTR: &str = "data-scroll-to-id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    pub no_scroll: bool,
    pub force_reload: bool,
    /// `Some("")` means "use the configured default main id".
    pub scroll_to_id: Option<String>,
    /// Hold the pre-navigation scroll position until the fetch completes.
    pub restore_scroll: bool,
}

impl TransitionOptions {
    /// Reads the recognized markers off an element's attributes.
    pub fn from_attributes<'a>(attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut options = Self::default();
        for (name, value) in attrs {
            if name.eq_ignore_ascii_case(NO_SCROLL_ATTR) {
                options.no_scroll = true;
            } else if name.eq_ignore_ascii_case(FORCE_RELOAD_ATTR) {
                options.force_reload = true;
            } else if name.eq_ignore_ascii_case(SCROLL_TO_ID_ATTR) {
                options.scroll_to_id = Some(value.trim().to_string());
            }
        }
        options
    }
}

/// A hyperlink as the interceptor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// `href` resolved against the document URL.
    pub href: Url,
    /// Browsing context name from the `target` attribute.
    pub target: Option<String>,
    pub no_pjax: bool,
    pub options: TransitionOptions,
}

impl Anchor {
    /// Builds an anchor from an `<a>` element. Returns `None` for elements
    /// that are not hyperlinks or whose `href` does not resolve.
    pub fn from_element(element: &Element, base: &Url) -> Option<Self> {
        if !element.is("a") {
            return None;
        }
        let href = base.join(element.attr("href")?.trim()).ok()?;
        Some(Self {
            href,
            target: element.attr("target").map(|t| t.trim().to_string()),
            no_pjax: element.has_attr(NO_PJAX_ATTR),
            options: TransitionOptions::from_attributes(
                element.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        })
    }

    /// True when following the link would leave the current browsing context.
    pub fn opens_elsewhere(&self) -> bool {
        self.target
            .as_deref()
            .is_some_and(|t| !t.is_empty() && !t.eq_ignore_ascii_case("_self"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSource {
    Anchor(Anchor),
    CurrentLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    url: Url,
    is_push: bool,
    options: TransitionOptions,
    source: NavigationSource,
}

impl TransitionRequest {
    /// A push transition following a clicked link.
    pub fn from_anchor(anchor: Anchor) -> Self {
        Self {
            url: anchor.href.clone(),
            is_push: true,
            options: anchor.options.clone(),
            source: NavigationSource::Anchor(anchor),
        }
    }

    /// A transition replaying the current location (back/forward).
    pub fn from_location(location: &Url, options: TransitionOptions) -> Self {
        Self {
            url: location.clone(),
            is_push: false,
            options,
            source: NavigationSource::CurrentLocation,
        }
    }

    /// A refresh of the current location that never hits the same-URL guard.
    pub fn reload(location: &Url) -> Self {
        Self::from_location(
            location,
            TransitionOptions {
                no_scroll: true,
                force_reload: true,
                ..Default::default()
            },
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_push(&self) -> bool {
        self.is_push
    }

    pub fn options(&self) -> &TransitionOptions {
        &self.options
    }

    pub fn source(&self) -> &NavigationSource {
        &self.source
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query string including the leading `?`, or empty.
    pub fn search(&self) -> String {
        self.url.query().map(|q| format!("?{q}")).unwrap_or_default()
    }

    /// Fragment without the leading `#`, or empty.
    pub fn hash(&self) -> &str {
        self.url.fragment().unwrap_or("")
    }

    pub fn origin(&self) -> url::Origin {
        self.url.origin()
    }
}

/// Element id named by the URL fragment, percent-decoded. `None` when the
/// fragment is missing or empty.
pub fn fragment_id(url: &Url) -> Option<String> {
    url.fragment()
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| percent_decode_str(fragment).decode_utf8_lossy().into_owned())
}

/// The URL with its fragment removed.
pub fn without_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}

/// Same origin, pathname and query: the two URLs name the same document.
pub fn same_document(a: &Url, b: &Url) -> bool {
    without_fragment(a) == without_fragment(b)
}
