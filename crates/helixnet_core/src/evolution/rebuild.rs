//! Link rebuild policy.
//!
//! A change in node membership always forces a rebuild. Otherwise a rebuild
//! is probabilistic and rate limited: the minimum interval must have passed
//! and a uniform draw must exceed the link stability. Retained links that
//! fall below the retention threshold force a rebuild as a fallback.

use serde::{Deserialize, Serialize};

/// Why the links of a tick look the way they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildReason {
    /// Node membership changed this tick.
    NodesChanged,
    /// Interval elapsed and the stability draw failed.
    Scheduled,
    /// Too few retained links survived the endpoint filter.
    RetentionFallback,
    /// Previous links kept.
    Retained,
}

impl RebuildReason {
    pub fn rebuilt(self) -> bool {
        !matches!(self, RebuildReason::Retained)
    }
}

/// Decides between rebuilding and retaining before the retention check.
///
/// `draw` is a uniform sample in `[0, 1)`.
pub fn should_rebuild(
    nodes_changed: bool,
    ticks_since_rebuild: u64,
    draw: f32,
    link_stability: f32,
    min_rebuild_interval: u64,
) -> RebuildReason {
    if nodes_changed {
        RebuildReason::NodesChanged
    } else if ticks_since_rebuild >= min_rebuild_interval && draw > link_stability {
        RebuildReason::Scheduled
    } else {
        RebuildReason::Retained
    }
}

/// True when too few links survived for the retained set to be usable.
pub fn retention_insufficient(surviving: usize, target_link_count: usize, threshold: f32) -> bool {
    (surviving as f32) < target_link_count as f32 * threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_change_always_rebuilds() {
        for ticks in [0, 1, 9, 10, 500] {
            for draw in [0.0, 0.5, 0.999] {
                assert_eq!(
                    should_rebuild(true, ticks, draw, 1.0, 10),
                    RebuildReason::NodesChanged
                );
            }
        }
    }

    #[test]
    fn test_interval_gates_scheduled_rebuild() {
        assert_eq!(should_rebuild(false, 9, 0.99, 0.1, 10), RebuildReason::Retained);
        assert_eq!(should_rebuild(false, 10, 0.99, 0.1, 10), RebuildReason::Scheduled);
    }

    #[test]
    fn test_stability_gates_scheduled_rebuild() {
        assert_eq!(should_rebuild(false, 50, 0.5, 0.8, 10), RebuildReason::Retained);
        assert_eq!(should_rebuild(false, 50, 0.9, 0.8, 10), RebuildReason::Scheduled);
        assert_eq!(should_rebuild(false, 50, 0.999, 1.0, 10), RebuildReason::Retained);
    }

    #[test]
    fn test_retention_threshold() {
        assert!(retention_insufficient(59, 100, 0.6));
        assert!(!retention_insufficient(60, 100, 0.6));
        assert!(!retention_insufficient(0, 0, 0.6));
    }
}
