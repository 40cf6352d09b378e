pub mod macros;

use helixnet_lib::model::config::{AppConfig, StructuralConfig};
use helixnet_lib::model::topology;
use helixnet_lib::model::{EvolutionScheduler, Topology};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[allow(dead_code)]
pub struct TopologyBuilder {
    config: AppConfig,
    node_count: usize,
    seed: u64,
}

#[allow(dead_code)]
impl TopologyBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            node_count: 20,
            seed: 42,
        }
    }

    pub fn nodes(mut self, count: usize) -> Self {
        self.node_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Only spine links: every optional pass and auxiliary family off.
    pub fn spine_only(mut self) -> Self {
        self.config.structure = StructuralConfig::spine_only();
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(&self) -> Topology {
        let mut rng = self.rng();
        topology::generate(self.node_count, &self.config.structure, &mut rng)
    }

    /// A scheduler over a freshly generated topology, plus the rng that
    /// continues where generation stopped.
    pub fn build_scheduler(&self) -> (EvolutionScheduler, ChaCha8Rng) {
        let mut rng = self.rng();
        let scheduler = EvolutionScheduler::generate(
            self.node_count,
            &self.config.structure,
            &self.config.evolution,
            &mut rng,
        );
        (scheduler, rng)
    }
}
