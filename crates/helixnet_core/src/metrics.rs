//! Runtime metrics for evolution ticks and animation frames.
//!
//! Provides structured logging and counters for monitoring how the live
//! topology and the frame loop behave over a run.

use crate::animation::FrameSample;
use crate::evolution::TickEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector shared by the evolution and frame loops.
pub struct Metrics {
    tick_count: AtomicU64,
    rebuild_count: AtomicU64,
    membership_changes: AtomicU64,
    frame_count: AtomicU64,
    node_count: AtomicU64,
    link_count: AtomicU64,
    summary_interval: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Metrics {
    /// Creates a collector that logs a summary every `summary_interval`
    /// ticks. Zero disables periodic summaries.
    #[must_use]
    pub fn new(summary_interval: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            rebuild_count: AtomicU64::new(0),
            membership_changes: AtomicU64::new(0),
            frame_count: AtomicU64::new(0),
            node_count: AtomicU64::new(0),
            link_count: AtomicU64::new(0),
            summary_interval,
            start_time: Instant::now(),
        }
    }

    /// Records a completed evolution tick.
    pub fn record_tick(&self, event: &TickEvent) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        if event.links_rebuilt {
            self.rebuild_count.fetch_add(1, Ordering::Relaxed);
        }
        if event.nodes_changed {
            self.membership_changes.fetch_add(1, Ordering::Relaxed);
        }
        self.node_count.store(event.node_count as u64, Ordering::Relaxed);
        self.link_count.store(event.link_count as u64, Ordering::Relaxed);

        if self.summary_interval > 0 && tick.is_multiple_of(self.summary_interval) {
            self.log_summary();
        }
    }

    /// Records a sampled frame.
    pub fn record_frame(&self, frame: &FrameSample) {
        self.frame_count.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            nodes = frame.node_count(),
            links = frame.link_count,
            "Frame sampled"
        );
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.node_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn link_count(&self) -> u64 {
        self.link_count.load(Ordering::Relaxed)
    }

    /// Gets elapsed time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs current counters at info level.
    pub fn log_summary(&self) {
        let secs = self.elapsed().as_secs_f64().max(1e-9);
        tracing::info!(
            ticks = self.tick_count(),
            rebuilds = self.rebuild_count(),
            membership_changes = self.membership_changes.load(Ordering::Relaxed),
            frames = self.frame_count(),
            fps = self.frame_count() as f64 / secs,
            nodes = self.node_count(),
            links = self.link_count(),
            "Helix summary"
        );
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` overrides `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::RebuildReason;

    fn event(rebuilt: bool, changed: bool) -> TickEvent {
        TickEvent {
            tick: 1,
            nodes_changed: changed,
            links_rebuilt: rebuilt,
            reason: if rebuilt {
                RebuildReason::Scheduled
            } else {
                RebuildReason::Retained
            },
            nodes_added: 0,
            nodes_removed: 0,
            ticks_since_rebuild: 0,
            node_count: 12,
            link_count: 30,
        }
    }

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new(10);
        assert_eq!(metrics.tick_count(), 0);
        assert_eq!(metrics.frame_count(), 0);
    }

    #[test]
    fn test_record_tick() {
        let metrics = Metrics::new(1);
        metrics.record_tick(&event(true, false));
        metrics.record_tick(&event(false, false));
        assert_eq!(metrics.tick_count(), 2);
        assert_eq!(metrics.rebuild_count(), 1);
        assert_eq!(metrics.node_count(), 12);
        assert_eq!(metrics.link_count(), 30);
    }

    #[test]
    fn test_record_frame() {
        let metrics = Metrics::default();
        metrics.record_frame(&FrameSample::default());
        assert_eq!(metrics.frame_count(), 1);
    }
}
