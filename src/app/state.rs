use crate::error::{Result, RunnerError};
use crate::model::buffers::{BufferSync, RenderBuffers};
use crate::model::config::AppConfig;
use crate::model::evolution::TaskSimulator;
use crate::model::metrics::Metrics;
use crate::model::{EvolutionScheduler, OrganicAnimationEngine, TickEvent};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// How evolution targets are driven.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Targets stay at the configured initial params.
    Steady,
    /// Targets follow a synthetic task signal.
    Task,
}

pub struct App {
    pub config: AppConfig,
    pub mode: RunMode,
    pub seed: u64,
    pub scheduler: EvolutionScheduler,
    pub engine: OrganicAnimationEngine,
    pub buffers: RenderBuffers,
    pub metrics: Metrics,
    pub simulator: TaskSimulator,
    rng: ChaCha8Rng,
}

impl App {
    /// Builds the initial topology and every component around it.
    pub fn new(config: AppConfig, mode: RunMode) -> Self {
        let config = config.sanitized();
        let seed = config.runtime.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scheduler = EvolutionScheduler::generate(
            config.runtime.initial_nodes,
            &config.structure,
            &config.evolution,
            &mut rng,
        );
        let engine = OrganicAnimationEngine::new(&config.animation, &config.structure.helix);
        let buffers = RenderBuffers::new(engine.config().links.segments + 1);
        let metrics = Metrics::new(config.runtime.summary_interval);

        tracing::info!(
            seed,
            ?mode,
            fingerprint = %config.fingerprint(),
            nodes = scheduler.topology().nodes.len(),
            links = scheduler.topology().links.len(),
            "Helix initialized"
        );

        Self {
            config,
            mode,
            seed,
            scheduler,
            engine,
            buffers,
            metrics,
            simulator: TaskSimulator::default(),
            rng,
        }
    }

    /// Loads and validates a TOML config. A missing file yields defaults
    /// unless `required` is set.
    pub fn load_config(path: &Path, required: bool) -> Result<AppConfig> {
        if !required && !path.exists() {
            tracing::info!(path = %path.display(), "Config not found, using defaults");
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        AppConfig::from_toml(&content).map_err(|e| RunnerError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// One evolution step. In task mode the scheduler's targets follow the
    /// simulator first.
    pub fn evolve(&mut self) -> TickEvent {
        if self.mode == RunMode::Task {
            let signal = self.simulator.next_signal(&mut self.rng);
            self.scheduler.apply_task(&signal);
        }
        let event = self.scheduler.tick(&mut self.rng);
        self.metrics.record_tick(&event);
        event
    }

    /// Samples a frame at `time` and pushes it into the render buffers.
    pub fn render_frame(&mut self, time: f32, dt: f32) {
        let frame = self.engine.sample(self.scheduler.topology(), time, dt);
        self.buffers.sync(frame);
        self.metrics.record_frame(frame);
    }
}
