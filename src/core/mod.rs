//! # Core Transition Logic
//!
//! Decides which navigations become pjax transitions and carries them out.
//! It talks to the page only through the `host` traits.
//!
//! ```text
//!        click / popstate
//!               │
//!               ▼
//!     ┌───────────────────┐   Effect::Ignore    ┌─────────────────┐
//!     │  action::update() │ ──────────────────▶ │ browser default │
//!     │   (interceptor)   │                     └─────────────────┘
//!     └─────────┬─────────┘
//!               │ Effect::Transition
//!               ▼
//!     ┌───────────────────┐      fetch      ┌─────────────────┐
//!     │   engine::Pjax    │ ──────────────▶ │ host::Fetcher   │
//!     │                   │                 └─────────────────┘
//!     │  reconcile        │
//!     │  scroll           │ ──────────────▶ host::Browser
//!     │  indicator        │
//!     └───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`]: host events and the `update()` interceptor
//! - [`request`]: `TransitionRequest` and the link markers it is built from
//! - [`state`]: in-flight tracking and the last known path
//! - [`engine`]: `Pjax`, the fetch and swap state machine
//! - [`reconcile`]: installing an incoming document, scripts included
//! - [`scroll`]: scroll targets and the fixed-header offset
//! - [`indicator`]: slow-load indication
//! - [`config`]: `~/.pjax/config.toml`, env and CLI overrides

pub mod action;
pub mod config;
pub mod engine;
pub mod indicator;
pub mod reconcile;
pub mod request;
pub mod scroll;
pub mod state;

pub use action::{Action, ClickEvent, Effect, IgnoreReason};
pub use engine::{Pjax, SkipReason, TransitionFailure, TransitionOutcome};
pub use request::{Anchor, TransitionOptions, TransitionRequest};
