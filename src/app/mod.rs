pub mod shutdown;
pub mod state;

pub use shutdown::ShutdownManager;
pub use state::{App, RunMode};

use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

impl App {
    /// Drives evolution ticks and frames until the configured duration
    /// elapses or shutdown is requested. A zero duration runs until ctrl-c.
    ///
    /// Both timers share one task, so a tick always finishes before the
    /// next tick or frame starts.
    pub async fn run(&mut self, shutdown: &ShutdownManager) -> Result<()> {
        let runtime = self.config.runtime.clone();
        let mut evolution =
            tokio::time::interval(Duration::from_millis(runtime.evolution_interval_ms.max(1)));
        evolution.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frames =
            tokio::time::interval(Duration::from_secs_f64(1.0 / runtime.target_fps.max(1) as f64));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let bounded = runtime.duration_secs > 0;
        let deadline = tokio::time::sleep(Duration::from_secs(runtime.duration_secs));
        tokio::pin!(deadline);

        let start = Instant::now();
        let mut last_frame = start;
        tracing::info!(
            duration_secs = runtime.duration_secs,
            evolution_interval_ms = runtime.evolution_interval_ms,
            target_fps = runtime.target_fps,
            "Runner started"
        );

        while !shutdown.is_shutdown_requested() {
            tokio::select! {
                _ = &mut deadline, if bounded => {
                    tracing::info!("Run duration elapsed");
                    break;
                }
                _ = evolution.tick() => {
                    self.evolve();
                }
                _ = frames.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;
                    self.render_frame(now.duration_since(start).as_secs_f32(), dt);
                }
            }
        }
        Ok(())
    }
}
