//! `Fetcher` over reqwest.
//!
//! Redirects are followed by the client; the final URL is reported back so
//! the engine can record it in history.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use super::fetch::{FetchError, FetchResponse, Fetcher};
use crate::core::config::ResolvedConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self, FetchError> {
        Self::new(config.request_timeout, &config.user_agent)
    }
}

fn map_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        info!("GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        debug!(
            "Response for {}: status={}, final_url={}, content_type={:?}",
            url, status, final_url, content_type
        );

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read body of {}: {}", final_url, e);
            map_error(e)
        })?;

        Ok(FetchResponse {
            status,
            url: final_url,
            content_type,
            body,
        })
    }
}
