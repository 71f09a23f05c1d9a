use std::fmt;

use async_trait::async_trait;
use url::Url;

/// Errors that can occur before a response arrives.
/// The engine treats every variant the same way: reload.
#[derive(Debug)]
pub enum FetchError {
    /// Connection refused, DNS, TLS, broken body stream.
    Network(String),
    /// The request exceeded the configured timeout.
    Timeout,
    /// The request was dropped before completing.
    Aborted,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Aborted => write!(f, "request aborted"),
        }
    }
}

impl std::error::Error for FetchError {}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET for `url`, asking for an HTML document.
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}
