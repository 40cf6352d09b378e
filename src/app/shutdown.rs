//! Graceful shutdown handling for the runner.
//!
//! Provides ctrl-c handling and the final summary on exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Manages graceful shutdown of the runner.
pub struct ShutdownManager {
    shutdown_requested: Arc<AtomicBool>,
    summary_on_exit: bool,
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownManager {
    /// Creates a new shutdown manager.
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            summary_on_exit: true,
        }
    }

    /// Sets whether to log a metrics summary on exit.
    pub fn set_summary_on_exit(&mut self, enabled: bool) {
        self.summary_on_exit = enabled;
    }

    /// Requests shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        tracing::info!("Shutdown requested");
    }

    /// Checks if shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Spawns a task that requests shutdown on ctrl-c. Needs a tokio runtime.
    pub fn listen_for_ctrl_c(&self) {
        let flag = self.shutdown_requested.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, initiating graceful shutdown...");
                flag.store(true, Ordering::SeqCst);
            }
        });
    }

    /// Runs exit procedures after the loops have stopped.
    pub fn cleanup(&self, app: &crate::app::App) {
        if self.summary_on_exit {
            app.metrics.log_summary();
        }
        tracing::info!(
            seed = app.seed,
            evictions = app.engine.evictions(),
            "Cleanup complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_manager_new() {
        let manager = ShutdownManager::new();
        assert!(!manager.is_shutdown_requested());
        assert!(manager.summary_on_exit);
    }

    #[test]
    fn test_shutdown_request() {
        let manager = ShutdownManager::new();
        manager.request_shutdown();
        assert!(manager.is_shutdown_requested());
    }

    #[test]
    fn test_summary_toggle() {
        let mut manager = ShutdownManager::new();
        manager.set_summary_on_exit(false);
        assert!(!manager.summary_on_exit);
    }
}
