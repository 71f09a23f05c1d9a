//! # Transition Engine
//!
//! `Pjax` owns the engine state, the host browser and the fetcher, and
//! carries out the effects the interceptor produces.
//!
//! ```text
//!  Idle ──▶ guard-check ──▶ fetching ──┬──▶ reconcile ──▶ Idle
//!              │                       │
//!              └──▶ Idle (no-op)       └──▶ hard reload
//! ```
//!
//! Only one transition is in flight at a time. A transition submitted while
//! another one waits on the network is dropped, not queued. Failures never
//! reach the caller as errors: the engine gives up on the partial update and
//! reloads the page, which always lands in a correct state.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use url::Url;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::indicator::{FadeIndicator, LoadIndicator};
use crate::core::reconcile;
use crate::core::request::{TransitionRequest, fragment_id, same_document, without_fragment};
use crate::core::scroll::{ScrollPlan, offset_scroll};
use crate::core::state::{EngineState, PathKey};
use crate::dom::{Document, parse_document};
use crate::host::{
    AFTER_TRANSITION_EVENT, BEFORE_TRANSITION_EVENT, Browser, CONTENT_LOADED_EVENT, FetchError,
    FetchResponse, Fetcher, FrameId,
};

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Push to the URL already shown, without `data-force-reload`.
    SameUrl,
    /// Another transition is waiting on the network.
    InFlight,
}

/// Why a fetched page could not be installed.
#[derive(Debug)]
pub enum TransitionFailure {
    Transport(FetchError),
    Status { status: u16, url: Url },
    NotHtml { content_type: String, url: Url },
    Unparseable { url: Url },
}

impl TransitionFailure {
    /// Final URL of the response, when one arrived.
    pub fn response_url(&self) -> Option<&Url> {
        match self {
            TransitionFailure::Transport(_) => None,
            TransitionFailure::Status { url, .. }
            | TransitionFailure::NotHtml { url, .. }
            | TransitionFailure::Unparseable { url } => Some(url),
        }
    }
}

#[derive(Debug)]
pub enum TransitionOutcome {
    Skipped(SkipReason),
    /// Same document, different hash: history updated, no fetch.
    ScrolledInPage { url: Url },
    Completed { url: Url, title: String },
    /// The transition failed and the host was told to reload.
    Reloaded(TransitionFailure),
}

impl TransitionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransitionOutcome::Completed { .. })
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct Pjax<B: Browser> {
    config: ResolvedConfig,
    fetcher: Arc<dyn Fetcher>,
    indicator: Arc<dyn LoadIndicator>,
    browser: Mutex<B>,
    state: Mutex<EngineState>,
}

impl<B: Browser> Pjax<B> {
    pub fn new(config: ResolvedConfig, fetcher: Arc<dyn Fetcher>, browser: B) -> Self {
        let state = EngineState::new(&browser.location());
        Self {
            config,
            fetcher,
            indicator: Arc::new(FadeIndicator),
            browser: Mutex::new(browser),
            state: Mutex::new(state),
        }
    }

    /// Replaces the default `FadeIndicator`.
    pub fn with_indicator(mut self, indicator: Arc<dyn LoadIndicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn browser(&self) -> &Mutex<B> {
        &self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser.into_inner()
    }

    pub async fn is_idle(&self) -> bool {
        self.state.lock().await.is_idle()
    }

    pub async fn last_known_path(&self) -> PathKey {
        self.state.lock().await.last_known_path.clone()
    }

    /// Runs the interceptor for a host event. Returns immediately; the host
    /// suppresses the default action when the effect asks for it and then
    /// drives `transition`.
    pub async fn dispatch(&self, action: Action) -> Effect {
        let location = self.browser.lock().await.location();
        let mut state = self.state.lock().await;
        let effect = update(&mut state, &self.config, &location, action);
        if let Effect::Ignore(reason) = &effect {
            debug!("Leaving navigation to the browser: {}", reason);
        }
        effect
    }

    /// `dispatch` followed by the transition, if any.
    pub async fn handle(&self, action: Action) -> Option<TransitionOutcome> {
        match self.dispatch(action).await {
            Effect::Ignore(_) => None,
            Effect::Transition(request) => Some(self.transition(request).await),
        }
    }

    /// Re-fetches and swaps the current page without a hard reload, keeping
    /// the runtime state of long-lived scripts.
    pub async fn reload(&self) -> TransitionOutcome {
        let location = self.browser.lock().await.location();
        self.transition(TransitionRequest::reload(&location)).await
    }

    pub async fn transition(&self, request: TransitionRequest) -> TransitionOutcome {
        // Nothing happens while a fetch is pending, not even an in-page jump.
        if !self.state.lock().await.is_idle() {
            debug!("Dropping transition to {}: another one is in flight", request.url());
            return TransitionOutcome::Skipped(SkipReason::InFlight);
        }
        if let Some(outcome) = self.try_same_document(&request).await {
            return outcome;
        }

        let Some(id) = self.state.lock().await.begin(request.url()) else {
            debug!("Dropping transition to {}: another one is in flight", request.url());
            return TransitionOutcome::Skipped(SkipReason::InFlight);
        };
        info!(
            "[{}] Transition to {} (push={})",
            id,
            request.url(),
            request.is_push()
        );

        let restore_frame = if request.options().restore_scroll {
            Some(self.hold_scroll_position().await)
        } else {
            None
        };

        let result = self
            .fetch_with_indicator(&request)
            .await
            .and_then(into_document);

        let mut browser = self.browser.lock().await;
        if let Some(frame) = restore_frame {
            browser.cancel_animation_frame(frame);
        }

        let (incoming, document_url) = match result {
            Ok(loaded) => loaded,
            Err(failure) => {
                warn!(
                    "[{}] Transition to {} failed ({}), reloading",
                    id,
                    request.url(),
                    failure
                );
                if request.is_push() {
                    let url = failure
                        .response_url()
                        .cloned()
                        .unwrap_or_else(|| request.url().clone());
                    browser.push_state("", &url);
                    self.state.lock().await.remember_path(&url);
                }
                browser.hard_reload();
                self.state.lock().await.finish();
                return TransitionOutcome::Reloaded(failure);
            }
        };

        let title = incoming.title.clone();
        if request.is_push() {
            let url = recorded_url(request.url(), &document_url);
            browser.push_state(&title, &url);
            self.state.lock().await.remember_path(&url);
        }

        let location = browser.location();
        let plan = ScrollPlan::resolve(&request, &location, &self.config);
        let offset_selector = self.config.scroll_offset_selector.as_deref();

        plan.apply_before_swap(&mut *browser, offset_selector);
        browser.dispatch_event(BEFORE_TRANSITION_EVENT);

        let report = reconcile::install_document(&mut *browser, incoming, &document_url);
        debug!("[{}] Scripts: {:?}", id, report);

        if !self.config.load_indicator_delay.is_zero() {
            self.indicator.end(&mut *browser);
        }
        browser.dispatch_event(AFTER_TRANSITION_EVENT);

        plan.apply_after_swap(&mut *browser, offset_selector);
        browser.dispatch_event(CONTENT_LOADED_EVENT);

        self.state.lock().await.finish();
        info!("[{}] Now at {} ({:?})", id, location, title);

        TransitionOutcome::Completed {
            url: location,
            title,
        }
    }

    /// Push transitions within the current document only update history and
    /// scroll to the new hash; nothing is fetched.
    async fn try_same_document(&self, request: &TransitionRequest) -> Option<TransitionOutcome> {
        if !request.is_push() || request.options().force_reload {
            return None;
        }

        let mut browser = self.browser.lock().await;
        let location = browser.location();
        if !same_document(request.url(), &location) {
            return None;
        }
        if request.url() == &location {
            debug!("Ignoring push to the current URL {}", location);
            return Some(TransitionOutcome::Skipped(SkipReason::SameUrl));
        }

        // History first, so the browser remembers the position we leave.
        let title = browser.title();
        browser.push_state(&title, request.url());
        self.state.lock().await.remember_path(request.url());

        if let Some(id) = fragment_id(request.url())
            && browser.scroll_into_view(&id)
        {
            offset_scroll(&mut *browser, self.config.scroll_offset_selector.as_deref());
        }

        Some(TransitionOutcome::ScrolledInPage {
            url: request.url().clone(),
        })
    }

    /// After a popstate, browsers jump to the scroll position remembered for
    /// the entry before our content is in. Pin the current position for the
    /// next frame; the frame is cancelled once the response is in.
    async fn hold_scroll_position(&self) -> FrameId {
        let mut browser = self.browser.lock().await;
        let (x, y) = browser.scroll_position();
        browser.request_animation_frame(Box::new(move |browser: &mut dyn Browser| {
            browser.scroll_to(x, y)
        }))
    }

    async fn fetch_with_indicator(
        &self,
        request: &TransitionRequest,
    ) -> Result<FetchResponse, TransitionFailure> {
        let mut fetch = self.fetcher.fetch(request.url());
        let delay = self.config.load_indicator_delay;

        let result = if delay.is_zero() {
            fetch.await
        } else {
            let early = tokio::select! {
                result = &mut fetch => Some(result),
                () = tokio::time::sleep(delay) => None,
            };
            match early {
                Some(result) => result,
                None => {
                    debug!("Still loading {} after {:?}", request.url(), delay);
                    self.indicator.start(&mut *self.browser.lock().await);
                    fetch.await
                }
            }
        };

        result.map_err(TransitionFailure::Transport)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn into_document(response: FetchResponse) -> Result<(Document, Url), TransitionFailure> {
    if !response.is_success() {
        return Err(TransitionFailure::Status {
            status: response.status,
            url: response.url,
        });
    }

    // A missing header is taken as HTML.
    let content_type = response
        .content_type
        .unwrap_or_else(|| "text/html".to_string());
    if !content_type.to_ascii_lowercase().contains("html") {
        return Err(TransitionFailure::NotHtml {
            content_type,
            url: response.url,
        });
    }

    if response.body.trim().is_empty() {
        return Err(TransitionFailure::Unparseable { url: response.url });
    }

    Ok((parse_document(&response.body), response.url))
}

/// The URL to record in history: the response URL when the server
/// redirected, otherwise the URL that was asked for. Redirect responses
/// never carry the fragment, so the requested one is kept.
fn recorded_url(requested: &Url, response_url: &Url) -> Url {
    if without_fragment(response_url) == without_fragment(requested) {
        return requested.clone();
    }
    let mut url = response_url.clone();
    if url.fragment().is_none() {
        url.set_fragment(requested.fragment());
    }
    url
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SameUrl => write!(f, "already at this URL"),
            SkipReason::InFlight => write!(f, "another transition is in flight"),
        }
    }
}

impl fmt::Display for TransitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionFailure::Transport(e) => write!(f, "{e}"),
            TransitionFailure::Status { status, url } => write!(f, "HTTP {status} from {url}"),
            TransitionFailure::NotHtml { content_type, url } => {
                write!(f, "{url} is {content_type}, not HTML")
            }
            TransitionFailure::Unparseable { url } => write!(f, "{url} returned no document"),
        }
    }
}

impl std::error::Error for TransitionFailure {}

impl fmt::Display for TransitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            TransitionOutcome::ScrolledInPage { url } => write!(f, "scrolled in page to {url}"),
            TransitionOutcome::Completed { url, title } => write!(f, "loaded {url} ({title:?})"),
            TransitionOutcome::Reloaded(failure) => write!(f, "reloaded after failure: {failure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::action::ClickEvent;
    use crate::core::request::{Anchor, TransitionOptions};
    use crate::headless::{HeadlessBrowser, ROW_HEIGHT};
    use crate::test_support::{
        CountingIndicator, StaticFetcher, html_response, page, test_browser,
    };

    const ORIGIN: &str = "https://docs.example.com";

    fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    fn quiet_config() -> ResolvedConfig {
        ResolvedConfig {
            load_indicator_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn start_browser() -> HeadlessBrowser {
        test_browser(
            &url("/guide").to_string(),
            &page(
                "Guide",
                "<header id=\"bar\" style=\"position: fixed; top: 0px; height: 40px\">Nav</header>\
                 <a id=\"to-api\" href=\"/api\">API</a>\
                 <h2 id=\"setup\">Setup</h2>",
            ),
        )
    }

    fn engine(fetcher: StaticFetcher, config: ResolvedConfig) -> Pjax<HeadlessBrowser> {
        let mut browser = start_browser();
        browser.clear_logs();
        Pjax::new(config, Arc::new(fetcher), browser)
    }

    fn api_fetcher() -> StaticFetcher {
        StaticFetcher::new().with(
            url("/api"),
            html_response(
                url("/api"),
                &page(
                    "API",
                    "<h1 id=\"top\">API</h1><script src=\"/js/site.js\"></script>\
                     <script>init()</script><section id=\"main\">Reference</section>",
                ),
            ),
        )
    }

    async fn click(pjax: &Pjax<HeadlessBrowser>, href: &str) -> Option<TransitionOutcome> {
        let anchor = {
            let browser = pjax.browser().lock().await;
            Anchor::from_element(
                &crate::dom::Element::new("a").with_attr("href", href),
                &browser.location(),
            )
            .unwrap()
        };
        pjax.handle(Action::Click(ClickEvent::primary(anchor))).await
    }

    #[tokio::test]
    async fn test_successful_push_transition() {
        let fetcher = api_fetcher();
        let pjax = engine(fetcher.clone(), quiet_config());

        let outcome = click(&pjax, "/api").await.unwrap();

        assert!(outcome.is_completed(), "{outcome}");
        assert!(pjax.is_idle().await);
        assert_eq!(fetcher.requests(), vec![url("/api")]);

        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/api"));
        assert_eq!(browser.title(), "API");
        assert_eq!(browser.history_len(), 2);
        assert!(browser.has_element("main"));
        assert!(!browser.has_element("setup"));
        assert_eq!(
            browser.events(),
            &[
                BEFORE_TRANSITION_EVENT.to_string(),
                AFTER_TRANSITION_EVENT.to_string(),
                CONTENT_LOADED_EVENT.to_string(),
            ]
        );
        assert_eq!(browser.reloads(), 0);
        drop(browser);

        assert_eq!(pjax.last_known_path().await, PathKey::of(&url("/api")));
    }

    #[tokio::test]
    async fn test_body_matches_fetched_body_minus_loaded_scripts() {
        let pjax = engine(api_fetcher(), quiet_config());

        click(&pjax, "/api").await.unwrap();

        let expected = parse_document(&page(
            "API",
            "<h1 id=\"top\">API</h1><script>init()</script><section id=\"main\">Reference</section>",
        ))
        .body;
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.document().body, expected);
        assert_eq!(browser.executed_scripts().len(), 1);
        assert_eq!(browser.executed_scripts()[0].text, "init()");
    }

    #[tokio::test]
    async fn test_same_url_push_is_noop() {
        let fetcher = StaticFetcher::new();
        let pjax = engine(fetcher.clone(), quiet_config());

        let outcome = pjax
            .transition(TransitionRequest::from_anchor(
                Anchor::from_element(
                    &crate::dom::Element::new("a").with_attr("href", "/guide"),
                    &url("/guide"),
                )
                .unwrap(),
            ))
            .await;

        assert!(matches!(outcome, TransitionOutcome::Skipped(SkipReason::SameUrl)));
        assert!(pjax.is_idle().await);
        assert!(fetcher.requests().is_empty());
        assert_eq!(pjax.browser().lock().await.history_len(), 1);
    }

    #[tokio::test]
    async fn test_force_reload_bypasses_same_url_guard() {
        let fetcher = StaticFetcher::new().with(
            url("/guide"),
            html_response(url("/guide"), &page("Guide v2", "<p>fresh</p>")),
        );
        let pjax = engine(fetcher.clone(), quiet_config());
        let el = crate::dom::Element::new("a")
            .with_attr("href", "/guide")
            .with_attr("data-force-reload", "");
        let request =
            TransitionRequest::from_anchor(Anchor::from_element(&el, &url("/guide")).unwrap());

        let outcome = pjax.transition(request).await;

        assert!(outcome.is_completed());
        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(pjax.browser().lock().await.title(), "Guide v2");
    }

    #[tokio::test]
    async fn test_same_document_hash_push_scrolls_locally() {
        let fetcher = StaticFetcher::new();
        let config = ResolvedConfig {
            scroll_offset_selector: Some("#bar".to_string()),
            ..quiet_config()
        };
        let pjax = engine(fetcher.clone(), config);

        let outcome = click(&pjax, "#setup").await.unwrap();

        assert!(matches!(outcome, TransitionOutcome::ScrolledInPage { .. }));
        assert!(fetcher.requests().is_empty());
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/guide#setup"));
        assert_eq!(browser.history_len(), 2);
        // setup is the third element; the fixed header is 40px tall.
        assert_eq!(browser.scroll_position(), (0.0, 2.0 * ROW_HEIGHT - 40.0));
    }

    #[tokio::test]
    async fn test_second_transition_while_pending_is_dropped() {
        let fetcher = api_fetcher()
            .with(url("/other"), html_response(url("/other"), &page("Other", "")))
            .with_delay(Duration::from_millis(50));
        let pjax = engine(fetcher.clone(), quiet_config());

        let (first, second) = tokio::join!(click(&pjax, "/api"), click(&pjax, "/other"));

        assert!(first.unwrap().is_completed());
        assert!(matches!(
            second.unwrap(),
            TransitionOutcome::Skipped(SkipReason::InFlight)
        ));
        assert_eq!(fetcher.requests(), vec![url("/api")]);
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.title(), "API");
        assert_eq!(browser.history_len(), 2);
    }

    #[tokio::test]
    async fn test_in_page_jump_while_pending_is_dropped() {
        let fetcher = api_fetcher().with_delay(Duration::from_millis(50));
        let config = ResolvedConfig {
            scroll_offset_selector: Some("#bar".to_string()),
            ..quiet_config()
        };
        let pjax = engine(fetcher.clone(), config);

        let (first, second) = tokio::join!(click(&pjax, "/api"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            click(&pjax, "#setup").await
        });

        assert!(first.unwrap().is_completed());
        assert!(matches!(
            second.unwrap(),
            TransitionOutcome::Skipped(SkipReason::InFlight)
        ));
        assert_eq!(fetcher.requests(), vec![url("/api")]);
        let browser = pjax.browser().lock().await;
        let history: Vec<_> = browser.history().iter().map(|e| e.url.clone()).collect();
        assert_eq!(history, vec![url("/guide"), url("/api")]);
    }

    #[tokio::test]
    async fn test_in_page_jump_decodes_hash() {
        let config = ResolvedConfig {
            scroll_offset_selector: Some("#bar".to_string()),
            ..quiet_config()
        };
        let browser = test_browser(
            &url("/menu").to_string(),
            &page("Menu", "<p>intro</p><h2 id=\"café\">Café</h2>"),
        );
        let pjax = Pjax::new(config, Arc::new(StaticFetcher::new()), browser);

        let outcome = click(&pjax, "#café").await.unwrap();

        assert!(matches!(outcome, TransitionOutcome::ScrolledInPage { .. }));
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location().fragment(), Some("caf%C3%A9"));
        assert_eq!(browser.scroll_position(), (0.0, ROW_HEIGHT));
    }

    #[tokio::test]
    async fn test_not_found_pushes_final_url_then_reloads() {
        let mut response = html_response(url("/moved/missing"), &page("Not Found", ""));
        response.status = 404;
        let pjax = engine(
            StaticFetcher::new().with(url("/missing"), response),
            quiet_config(),
        );

        let outcome = click(&pjax, "/missing").await.unwrap();

        assert!(matches!(
            outcome,
            TransitionOutcome::Reloaded(TransitionFailure::Status { status: 404, .. })
        ));
        assert!(pjax.is_idle().await);
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.reloads(), 1);
        assert_eq!(browser.location(), url("/moved/missing"));
        // The old content was not replaced.
        assert_eq!(browser.title(), "Guide");
        assert!(browser.has_element("setup"));
    }

    #[tokio::test]
    async fn test_transport_failure_reloads_requested_url() {
        let pjax = engine(StaticFetcher::new(), quiet_config());

        let outcome = click(&pjax, "/unreachable").await.unwrap();

        assert!(matches!(
            outcome,
            TransitionOutcome::Reloaded(TransitionFailure::Transport(_))
        ));
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/unreachable"));
        assert_eq!(browser.reloads(), 1);
    }

    #[tokio::test]
    async fn test_non_html_response_reloads() {
        let mut response = html_response(url("/feed"), "<rss></rss>");
        response.content_type = Some("application/rss+xml".to_string());
        let pjax = engine(StaticFetcher::new().with(url("/feed"), response), quiet_config());

        let outcome = click(&pjax, "/feed").await.unwrap();

        assert!(matches!(
            outcome,
            TransitionOutcome::Reloaded(TransitionFailure::NotHtml { .. })
        ));
        assert_eq!(pjax.browser().lock().await.reloads(), 1);
    }

    #[tokio::test]
    async fn test_blank_response_reloads() {
        let pjax = engine(
            StaticFetcher::new().with(url("/blank"), html_response(url("/blank"), "  \n")),
            quiet_config(),
        );
        let outcome = click(&pjax, "/blank").await.unwrap();
        assert!(matches!(
            outcome,
            TransitionOutcome::Reloaded(TransitionFailure::Unparseable { .. })
        ));
    }

    #[tokio::test]
    async fn test_redirect_is_recorded_in_history() {
        let fetcher = StaticFetcher::new().with(
            url("/old-api"),
            html_response(url("/api/v2"), &page("API v2", "")),
        );
        let pjax = engine(fetcher, quiet_config());

        click(&pjax, "/old-api").await.unwrap();

        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/api/v2"));
        drop(browser);
        assert_eq!(pjax.last_known_path().await, PathKey::of(&url("/api/v2")));
    }

    #[test]
    fn test_redirect_keeps_requested_fragment() {
        assert_eq!(
            recorded_url(&url("/old#part"), &url("/new")),
            url("/new#part")
        );
        assert_eq!(recorded_url(&url("/same#part"), &url("/same")), url("/same#part"));
    }

    #[tokio::test]
    async fn test_reload_refreshes_without_hard_reload() {
        let fetcher = StaticFetcher::new().with(
            url("/guide"),
            html_response(url("/guide"), &page("Guide (updated)", "<p id=\"new\">new</p>")),
        );
        let pjax = engine(fetcher.clone(), quiet_config());
        pjax.browser().lock().await.scroll_to(0.0, 300.0);

        let outcome = pjax.reload().await;

        assert!(outcome.is_completed());
        assert_eq!(fetcher.requests(), vec![url("/guide")]);
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.reloads(), 0);
        assert_eq!(browser.title(), "Guide (updated)");
        assert!(browser.has_element("new"));
        assert_eq!(browser.history_len(), 1);
        // reload() does not scroll.
        assert_eq!(browser.scroll_position(), (0.0, 300.0));
    }

    #[tokio::test]
    async fn test_popstate_replays_location_without_push() {
        let fetcher = api_fetcher().with(
            url("/guide"),
            html_response(url("/guide"), &page("Guide", "<p>back again</p>")),
        );
        let pjax = engine(fetcher.clone(), quiet_config());
        click(&pjax, "/api").await.unwrap();

        pjax.browser().lock().await.go_back();
        let outcome = pjax.handle(Action::PopState).await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(fetcher.requests(), vec![url("/api"), url("/guide")]);
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/guide"));
        assert_eq!(browser.title(), "Guide");
        // Going back must not grow history.
        assert_eq!(browser.history_len(), 2);
        assert!(browser.can_go_forward());
        // The scroll hold frame was cancelled once the response arrived.
        assert_eq!(browser.pending_frames(), 0);
    }

    #[tokio::test]
    async fn test_fetched_hash_target_lands_below_fixed_header() {
        let fetcher = StaticFetcher::new().with(
            url("/api"),
            html_response(
                url("/api"),
                &page(
                    "API",
                    "<header id=\"bar\" style=\"position: fixed; top: 0px; height: 40px\"></header>\
                     <p>a</p><p>b</p><section id=\"main\">Main</section>",
                ),
            ),
        );
        let config = ResolvedConfig {
            scroll_offset_selector: Some("#bar".to_string()),
            ..quiet_config()
        };
        let pjax = engine(fetcher.clone(), config);

        let outcome = click(&pjax, "/api#main").await.unwrap();

        assert!(outcome.is_completed(), "{outcome}");
        assert_eq!(fetcher.requests(), vec![url("/api#main")]);
        let mut browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/api#main"));
        assert_eq!(browser.pending_frames(), 1);
        browser.run_frames();
        assert_eq!(browser.scroll_position(), (0.0, 3.0 * ROW_HEIGHT - 40.0));
    }

    #[tokio::test]
    async fn test_scroll_to_id_lands_below_fixed_header() {
        let fetcher = StaticFetcher::new().with(
            url("/api"),
            html_response(
                url("/api"),
                &page(
                    "API",
                    "<header id=\"bar\" style=\"position: fixed; top: 0px; height: 40px\"></header>\
                     <p>a</p><p>b</p><section id=\"main\">Main</section>",
                ),
            ),
        );
        let config = ResolvedConfig {
            scroll_offset_selector: Some("#bar".to_string()),
            default_main_id: Some("main".to_string()),
            ..quiet_config()
        };
        let pjax = engine(fetcher, config);
        let el = crate::dom::Element::new("a")
            .with_attr("href", "/api")
            .with_attr("data-scroll-to-id", "");
        let anchor = Anchor::from_element(&el, &url("/guide")).unwrap();

        pjax.handle(Action::Click(ClickEvent::primary(anchor)))
            .await
            .unwrap();

        let mut browser = pjax.browser().lock().await;
        assert_eq!(browser.pending_frames(), 1);
        browser.run_frames();
        assert_eq!(browser.scroll_position(), (0.0, 3.0 * ROW_HEIGHT - 40.0));
    }

    #[tokio::test]
    async fn test_history_transition_scrolls_to_top_without_push() {
        let fetcher = StaticFetcher::new().with(
            url("/intro"),
            html_response(url("/intro"), &page("Intro", "<p>intro</p>")),
        );
        let pjax = engine(fetcher, quiet_config());
        let request = TransitionRequest::from_location(&url("/intro"), TransitionOptions::default());
        pjax.browser().lock().await.scroll_to(0.0, 200.0);

        pjax.transition(request).await;

        // Not a push: location is untouched, and the page scrolls to the top.
        let browser = pjax.browser().lock().await;
        assert_eq!(browser.location(), url("/guide"));
        assert_eq!(browser.scroll_position(), (0.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_triggers_load_indicator() {
        let indicator = Arc::new(CountingIndicator::default());
        let fetcher = api_fetcher().with_delay(Duration::from_millis(400));
        let pjax = engine(fetcher, ResolvedConfig::default()).with_indicator(indicator.clone());

        click(&pjax, "/api").await.unwrap();

        assert_eq!(indicator.starts(), 1);
        assert_eq!(indicator.ends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fetch_cancels_load_indicator() {
        let indicator = Arc::new(CountingIndicator::default());
        let fetcher = api_fetcher().with_delay(Duration::from_millis(100));
        let pjax = engine(fetcher, ResolvedConfig::default()).with_indicator(indicator.clone());

        click(&pjax, "/api").await.unwrap();

        assert_eq!(indicator.starts(), 0);
        assert_eq!(indicator.ends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_disables_indication() {
        let indicator = Arc::new(CountingIndicator::default());
        let fetcher = api_fetcher().with_delay(Duration::from_secs(2));
        let pjax = engine(fetcher, quiet_config()).with_indicator(indicator.clone());

        click(&pjax, "/api").await.unwrap();

        assert_eq!(indicator.starts(), 0);
        assert_eq!(indicator.ends(), 0);
    }

    #[tokio::test]
    async fn test_ignored_click_leaves_everything_alone() {
        let fetcher = StaticFetcher::new();
        let pjax = engine(fetcher.clone(), quiet_config());

        let outcome = click(&pjax, "https://elsewhere.example.org/").await;

        assert!(outcome.is_none());
        assert!(fetcher.requests().is_empty());
        assert_eq!(pjax.browser().lock().await.history_len(), 1);
    }
}
