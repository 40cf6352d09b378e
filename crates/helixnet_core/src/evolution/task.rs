//! Task-driven evolution targets.
//!
//! A [`TaskSignal`] describes how demanding the current workload is. The
//! scheduler never jumps to the derived targets; it blends toward them.

use crate::config::{EvolutionParams, MAX_EDGES, MAX_NODES};
use rand::Rng;
use std::f32::consts::TAU;

/// Workload description fed in by a collaborator or the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSignal {
    /// Structural demand in `[0, 1]`. Scales node and link targets.
    pub complexity: f32,
    /// Urgency in `[0, 1]`. Raises growth and lowers link stability.
    pub intensity: f32,
}

impl TaskSignal {
    pub fn idle() -> Self {
        Self {
            complexity: 0.0,
            intensity: 0.0,
        }
    }

    /// Target params for this signal, relative to the resting `base` params.
    pub fn target_params(&self, base: &EvolutionParams) -> EvolutionParams {
        let complexity = self.complexity.clamp(0.0, 1.0);
        let intensity = self.intensity.clamp(0.0, 1.0);
        let node_scale = 1.0 + complexity * 1.5;
        let link_scale = 1.0 + complexity * 2.0;
        EvolutionParams {
            target_node_count: ((base.target_node_count as f32 * node_scale).round() as usize)
                .min(MAX_NODES),
            target_link_count: ((base.target_link_count as f32 * link_scale).round() as usize)
                .min(MAX_EDGES),
            growth_rate: (base.growth_rate + intensity * (1.0 - base.growth_rate) * 0.6)
                .clamp(0.0, 1.0),
            pruning_rate: (base.pruning_rate * (1.0 - intensity * 0.5)).clamp(0.0, 1.0),
            link_stability: (base.link_stability * (1.0 - intensity * 0.4)).clamp(0.0, 1.0),
        }
    }
}

/// Produces a slowly varying synthetic workload with occasional bursts.
#[derive(Debug, Clone)]
pub struct TaskSimulator {
    phase: f32,
    period_ticks: f32,
    burst: f32,
    burst_chance: f32,
}

impl Default for TaskSimulator {
    fn default() -> Self {
        Self::new(120.0, 0.02)
    }
}

impl TaskSimulator {
    pub fn new(period_ticks: f32, burst_chance: f32) -> Self {
        Self {
            phase: 0.0,
            period_ticks: period_ticks.max(1.0),
            burst: 0.0,
            burst_chance: burst_chance.clamp(0.0, 1.0),
        }
    }

    pub fn next_signal<R: Rng>(&mut self, rng: &mut R) -> TaskSignal {
        self.phase = (self.phase + TAU / self.period_ticks) % TAU;
        if rng.gen::<f32>() < self.burst_chance {
            self.burst = rng.gen_range(0.5..=1.0);
        } else {
            self.burst *= 0.9;
        }
        TaskSignal {
            complexity: 0.5 + 0.5 * self.phase.sin(),
            intensity: self.burst.clamp(0.0, 1.0),
        }
    }
}
