//! Administrative switch for the primary index

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum::{Display, IntoStaticStr};

/// Path a single `search_errors` call takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchRoute {
    /// Primary index enabled: try it first
    Primary,
    /// Primary index disabled: straight to the record store
    FallbackForced,
    /// Primary index failed for this call: record store as recovery
    FallbackRecover,
}

/// Whether the primary index should be attempted.
///
/// Cloned handles share one flag, so a toggle through any handle is seen by
/// every gateway holding a clone. Reads are relaxed: a toggle racing an
/// in-flight call may or may not affect that call.
#[derive(Debug, Clone)]
pub struct IndexAvailability {
    enabled: Arc<AtomicBool>,
}

impl IndexAvailability {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn enabled() -> Self {
        Self::new(true)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flip the switch; returns the previous state
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            tracing::info!(enabled, "Primary search index availability changed");
        }
        previous
    }

    /// Initial route for a search call
    pub fn route(&self) -> SearchRoute {
        if self.is_enabled() {
            SearchRoute::Primary
        } else {
            SearchRoute::FallbackForced
        }
    }
}

impl Default for IndexAvailability {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_follows_flag() {
        let availability = IndexAvailability::disabled();
        assert_eq!(availability.route(), SearchRoute::FallbackForced);

        assert!(!availability.set_enabled(true));
        assert_eq!(availability.route(), SearchRoute::Primary);
    }

    #[test]
    fn test_clones_share_state() {
        let a = IndexAvailability::enabled();
        let b = a.clone();
        b.set_enabled(false);
        assert!(!a.is_enabled());
    }

    #[test]
    fn test_concurrent_toggles() {
        let availability = IndexAvailability::disabled();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let availability = availability.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        availability.set_enabled(i % 2 == 0);
                        let _ = availability.route();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        availability.set_enabled(true);
        assert!(availability.is_enabled());
    }

    #[test]
    fn test_route_labels() {
        assert_eq!(SearchRoute::FallbackRecover.to_string(), "fallback_recover");
        let label: &'static str = SearchRoute::Primary.into();
        assert_eq!(label, "primary");
    }
}
