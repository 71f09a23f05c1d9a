//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::core::indicator::LoadIndicator;
use crate::core::request::without_fragment;
use crate::headless::HeadlessBrowser;
use crate::host::{Browser, FetchError, FetchResponse, Fetcher};

/// A headless browser that has fully loaded `html` at `url`.
pub fn test_browser(url: &str, html: &str) -> HeadlessBrowser {
    HeadlessBrowser::load(Url::parse(url).expect("test url"), html)
}

/// A complete page sharing the site-wide `/js/site.js` script.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title>\
         <script src=\"/js/site.js\"></script></head><body>{body}</body></html>"
    )
}

/// A 200 `text/html` response served from `url`.
pub fn html_response(url: Url, body: &str) -> FetchResponse {
    FetchResponse {
        status: 200,
        url,
        content_type: Some("text/html; charset=utf-8".to_string()),
        body: body.to_string(),
    }
}

/// Serves canned responses and records what was asked for. Unknown URLs
/// fail like an unreachable host.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<Url, FetchResponse>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: Url, response: FetchResponse) -> Self {
        self.responses.insert(without_fragment(&url), response);
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.requests.lock().expect("requests lock").push(url.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(&without_fragment(url))
            .cloned()
            .ok_or_else(|| FetchError::Network(format!("no route to {url}")))
    }
}

/// Counts indicator calls instead of touching the page.
#[derive(Default)]
pub struct CountingIndicator {
    starts: AtomicUsize,
    ends: AtomicUsize,
}

impl CountingIndicator {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

impl LoadIndicator for CountingIndicator {
    fn start(&self, _browser: &mut dyn Browser) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self, _browser: &mut dyn Browser) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}
