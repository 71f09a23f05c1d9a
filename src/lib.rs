//! pjax: intercepts same-origin link clicks and history navigation, fetches
//! the target page in the background and swaps its body into the live
//! document instead of doing a full page load.

pub mod core;
pub mod dom;
pub mod headless;
pub mod host;

#[cfg(test)]
pub mod test_support;

pub use crate::core::config::ResolvedConfig;
pub use crate::core::{Action, Effect, Pjax, TransitionOutcome, TransitionRequest};
pub use crate::headless::HeadlessBrowser;
pub use crate::host::{Browser, Fetcher, HttpFetcher};
