//! # Engine State
//!
//! The mutable context shared by the interceptor and the engine.
//!
//! ```text
//! EngineState
//! ├── in_flight: Option<InFlight>   // at most one transition at a time
//! └── last_known_path: PathKey      // pathname + query of the last navigation
//! ```
//!
//! `last_known_path` is what makes popstate events meaningful: a popstate
//! whose pathname and query match it came from a hash change or from a
//! spurious initial event, and is dropped.

use url::Url;
use uuid::Uuid;

/// Pathname and query string of a location. The fragment is left out on
/// purpose so that hash-only changes compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub pathname: String,
    pub search: Option<String>,
}

impl PathKey {
    pub fn of(url: &Url) -> Self {
        Self {
            pathname: url.path().to_string(),
            search: url.query().filter(|q| !q.is_empty()).map(|q| q.to_string()),
        }
    }
}

/// The transition currently waiting on the network.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub id: Uuid,
    pub url: Url,
}

#[derive(Debug, Clone)]
pub struct EngineState {
    pub in_flight: Option<InFlight>,
    pub last_known_path: PathKey,
}

impl EngineState {
    pub fn new(location: &Url) -> Self {
        Self {
            in_flight: None,
            last_known_path: PathKey::of(location),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    pub fn remember_path(&mut self, location: &Url) {
        self.last_known_path = PathKey::of(location);
    }

    pub fn path_unchanged(&self, location: &Url) -> bool {
        self.last_known_path == PathKey::of(location)
    }

    /// Claims the in-flight slot. Returns `None` if it is already taken.
    pub fn begin(&mut self, url: &Url) -> Option<Uuid> {
        if self.in_flight.is_some() {
            return None;
        }
        let id = Uuid::new_v4();
        self.in_flight = Some(InFlight {
            id,
            url: url.clone(),
        });
        Some(id)
    }

    pub fn finish(&mut self) {
        self.in_flight = None;
    }
}
