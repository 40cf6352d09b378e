//! Incremental evolution of the live topology.
//!
//! One call to [`tick`] runs the full step in order: pulse, mutation
//! (growth and pruning), auxiliary refresh, the rebuild decision, and
//! either a link rebuild or a filtered retain. [`EvolutionScheduler`] owns
//! the live state between ticks and blends its params toward task targets.

pub mod rebuild;
pub mod task;

use crate::config::{EvolutionConfig, EvolutionParams, StructuralConfig, MAX_NODES};
use crate::topology::{self, auxiliary, base_node_id};
use helixnet_data::{Node, NodeLayer, Topology};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub use rebuild::{retention_insufficient, should_rebuild, RebuildReason};
pub use task::{TaskSignal, TaskSimulator};

/// Live topology plus the counters the scheduler carries between ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvolutionState {
    pub topology: Topology,
    pub tick: u64,
    pub ticks_since_rebuild: u64,
    /// Serial for the next grown base node id.
    pub next_serial: u64,
}

impl EvolutionState {
    pub fn new(topology: Topology) -> Self {
        let next_serial = topology
            .base_nodes()
            .filter_map(|n| n.id.strip_prefix('n').and_then(|s| s.parse::<u64>().ok()))
            .max()
            .map(|m| m + 1)
            .unwrap_or(topology.nodes.len() as u64);
        Self {
            topology,
            tick: 0,
            ticks_since_rebuild: 0,
            next_serial,
        }
    }
}

/// Structured record of one evolution step, for observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub tick: u64,
    pub nodes_changed: bool,
    pub links_rebuilt: bool,
    pub reason: RebuildReason,
    pub nodes_added: usize,
    pub nodes_removed: usize,
    /// Ticks since the last rebuild, after this tick.
    pub ticks_since_rebuild: u64,
    pub node_count: usize,
    pub link_count: usize,
}

/// Roughly normal jitter in `[-1.5, 1.5]` with unit-ish spread.
fn gaussian_jitter<R: Rng>(rng: &mut R) -> f32 {
    (rng.gen::<f32>() + rng.gen::<f32>() + rng.gen::<f32>() - 1.5) * 2.0
}

/// Cosmetic liveliness: bounded activation jitter and a resampled active flag.
pub fn pulse<R: Rng>(nodes: &mut [Node], config: &EvolutionConfig, rng: &mut R) {
    let jitter = config.pulse.jitter;
    for node in nodes.iter_mut() {
        if jitter > 0.0 {
            node.activation = (node.activation + rng.gen_range(-jitter..=jitter)).clamp(0.0, 1.0);
        }
        node.active = rng.gen::<f32>() < node.activation.max(config.pulse.min_active_chance);
    }
}

/// Removes `id` and, transitively, every auxiliary node that depends on it.
/// Returns the number of nodes removed.
pub fn remove_with_dependents(nodes: &mut Vec<Node>, id: &str) -> usize {
    let before = nodes.len();
    let mut doomed: HashSet<String> = HashSet::from([id.to_string()]);
    loop {
        let extra: Vec<String> = nodes
            .iter()
            .filter(|n| !doomed.contains(&n.id) && doomed.iter().any(|d| n.depends_on(d)))
            .map(|n| n.id.clone())
            .collect();
        if extra.is_empty() {
            break;
        }
        doomed.extend(extra);
    }
    nodes.retain(|n| !doomed.contains(&n.id));
    before - nodes.len()
}

/// Re-derives activation from each node's share of active neighbors.
pub fn reactivate_from_degree<R: Rng>(topology: &mut Topology, jitter: f32, rng: &mut R) {
    let active: HashMap<String, bool> = topology
        .nodes
        .iter()
        .map(|n| (n.id.clone(), n.active))
        .collect();
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    for link in &topology.links {
        for (me, other) in [(&link.source, &link.target), (&link.target, &link.source)] {
            let entry = totals.entry(me.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if active.get(other).copied().unwrap_or(false) {
                entry.1 += 1;
            }
        }
    }
    let ratios: HashMap<String, f32> = totals
        .into_iter()
        .map(|(id, (degree, live))| (id.to_string(), live as f32 / degree as f32))
        .collect();
    for node in &mut topology.nodes {
        let ratio = ratios.get(&node.id).copied().unwrap_or(0.0);
        node.activation = (ratio + gaussian_jitter(rng) * jitter).clamp(0.0, 1.0);
        node.active = node.activation > 0.5;
    }
    let active: HashMap<&str, bool> = topology
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.active))
        .collect();
    for link in &mut topology.links {
        link.active = active.get(link.source.as_str()).copied().unwrap_or(false)
            || active.get(link.target.as_str()).copied().unwrap_or(false);
    }
}

/// Advances the live topology by one evolution step.
pub fn tick<R: Rng>(
    prev: EvolutionState,
    params: &EvolutionParams,
    structure: &StructuralConfig,
    config: &EvolutionConfig,
    rng: &mut R,
) -> (EvolutionState, TickEvent) {
    let mut state = prev;
    state.tick += 1;
    let before: HashSet<String> = state.topology.nodes.iter().map(|n| n.id.clone()).collect();
    let nodes = &mut state.topology.nodes;

    if config.pulse.enabled {
        pulse(nodes, config, rng);
    }

    let base_count = nodes.iter().filter(|n| n.layer.is_base()).count();
    let upper = config
        .max_nodes
        .min(params.target_node_count.max(config.min_nodes))
        .min(MAX_NODES);
    let mut added = 0;
    let mut removed = 0;

    if base_count < upper && nodes.len() < MAX_NODES && rng.gen::<f32>() < params.growth_rate {
        nodes.push(Node::base(base_node_id(state.next_serial), NodeLayer::Hidden));
        state.next_serial += 1;
        added += 1;
    }
    if base_count > config.min_nodes && rng.gen::<f32>() < params.pruning_rate {
        let base_ids: Vec<String> = nodes
            .iter()
            .filter(|n| n.layer.is_base())
            .map(|n| n.id.clone())
            .collect();
        let victim = &base_ids[rng.gen_range(0..base_ids.len())];
        removed += remove_with_dependents(nodes, victim);
    }

    added += auxiliary::spawn_bridges(nodes, structure, rng);
    added += auxiliary::spawn_sub_strands(nodes, structure, rng);
    if structure.end_noise.enabled && rng.gen::<f32>() < structure.end_noise.spawn_chance {
        removed += auxiliary::remove_family(nodes, NodeLayer::EndNoise);
        added += auxiliary::spawn_end_noise(nodes, structure, state.tick, rng);
    }
    if structure.floating.enabled && rng.gen::<f32>() < structure.floating.spawn_chance {
        added += auxiliary::spawn_floating(nodes, structure, 1, rng);
    }

    let nodes_changed =
        nodes.len() != before.len() || nodes.iter().any(|n| !before.contains(&n.id));
    if nodes_changed {
        topology::retag_base_nodes(nodes, &structure.layers);
    }

    let ticks_since_rebuild = state.ticks_since_rebuild + 1;
    let draw = rng.gen::<f32>();
    let mut reason = should_rebuild(
        nodes_changed,
        ticks_since_rebuild,
        draw,
        params.link_stability,
        config.min_rebuild_interval,
    );
    if !reason.rebuilt() {
        state.topology.retain_valid_links();
        if retention_insufficient(
            state.topology.links.len(),
            params.target_link_count,
            config.retention_threshold,
        ) {
            reason = RebuildReason::RetentionFallback;
        }
    }

    if reason.rebuilt() {
        state.topology.links = topology::build_links(
            &state.topology.nodes,
            Some(params.target_link_count),
            structure,
            rng,
        );
        if config.reactivate_from_degree {
            reactivate_from_degree(&mut state.topology, config.reactivation_jitter, rng);
        }
        state.ticks_since_rebuild = 0;
    } else {
        state.ticks_since_rebuild = ticks_since_rebuild;
    }

    let event = TickEvent {
        tick: state.tick,
        nodes_changed,
        links_rebuilt: reason.rebuilt(),
        reason,
        nodes_added: added,
        nodes_removed: removed,
        ticks_since_rebuild: state.ticks_since_rebuild,
        node_count: state.topology.nodes.len(),
        link_count: state.topology.links.len(),
    };
    tracing::debug!(
        tick = event.tick,
        nodes_changed = event.nodes_changed,
        reason = ?event.reason,
        added = event.nodes_added,
        removed = event.nodes_removed,
        nodes = event.node_count,
        links = event.link_count,
        "Evolution tick"
    );
    (state, event)
}

/// Owner of the live topology across ticks.
#[derive(Debug)]
pub struct EvolutionScheduler {
    structure: StructuralConfig,
    config: EvolutionConfig,
    state: EvolutionState,
    params: EvolutionParams,
    target: EvolutionParams,
}

impl EvolutionScheduler {
    pub fn new(topology: Topology, structure: &StructuralConfig, config: &EvolutionConfig) -> Self {
        let config = config.sanitized();
        let params = config.initial.clone();
        Self {
            structure: structure.sanitized(),
            state: EvolutionState::new(topology),
            target: params.clone(),
            params,
            config,
        }
    }

    /// Generates an initial topology and takes ownership of it.
    pub fn generate<R: Rng>(
        node_count: usize,
        structure: &StructuralConfig,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> Self {
        let topology = topology::generate(node_count, structure, rng);
        Self::new(topology, structure, config)
    }

    /// Blends params one step toward the target, then advances the topology.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TickEvent {
        self.params
            .blend_toward(&self.target, self.config.param_blend_rate);
        let prev = std::mem::take(&mut self.state);
        let (next, event) = tick(prev, &self.params, &self.structure, &self.config, rng);
        self.state = next;
        event
    }

    /// Sets the params the scheduler blends toward.
    pub fn set_target_params(&mut self, target: EvolutionParams) {
        self.target = target.sanitized();
    }

    /// Replaces the current params immediately, bypassing the blend.
    pub fn set_params(&mut self, params: EvolutionParams) {
        self.params = params.sanitized();
        self.target = self.params.clone();
    }

    pub fn apply_task(&mut self, signal: &TaskSignal) {
        let target = signal.target_params(&self.config.initial);
        self.set_target_params(target);
    }

    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    pub fn target_params(&self) -> &EvolutionParams {
        &self.target
    }

    pub fn topology(&self) -> &Topology {
        &self.state.topology
    }

    pub fn state(&self) -> &EvolutionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn quiet_config() -> EvolutionConfig {
        EvolutionConfig {
            min_nodes: 2,
            max_nodes: 50,
            pulse: crate::config::PulseConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_next_serial_follows_base_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let topo = topology::generate(7, &StructuralConfig::spine_only(), &mut rng);
        assert_eq!(EvolutionState::new(topo).next_serial, 7);
    }

    #[test]
    fn test_cascade_removes_bridge_and_branch() {
        let mut nodes = topology::create_base_nodes(4, &Default::default());
        nodes.push(
            Node::auxiliary("bridge-n0-n1", NodeLayer::Bridge, Default::default())
                .with_partners("n0", "n1"),
        );
        nodes.push(
            Node::auxiliary("sub-n1-0", NodeLayer::SubStrand, Default::default()).with_parent("n1"),
        );
        nodes.push(
            Node::auxiliary("sub-n1-1", NodeLayer::SubStrand, Default::default()).with_parent("n1"),
        );
        nodes.push(
            Node::auxiliary("sub-n2-0", NodeLayer::SubStrand, Default::default()).with_parent("n2"),
        );
        assert_eq!(remove_with_dependents(&mut nodes, "n1"), 4);
        assert!(nodes.iter().any(|n| n.id == "sub-n2-0"));
        assert!(nodes.iter().all(|n| !n.depends_on("n1")));
    }

    #[test]
    fn test_growth_forces_rebuild() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let structure = StructuralConfig::spine_only();
        let topo = topology::generate(5, &structure, &mut rng);
        let params = EvolutionParams {
            target_node_count: 50,
            target_link_count: 0,
            growth_rate: 1.0,
            pruning_rate: 0.0,
            link_stability: 1.0,
        };
        let (state, event) = tick(
            EvolutionState::new(topo),
            &params,
            &structure,
            &quiet_config(),
            &mut rng,
        );
        assert!(event.nodes_changed);
        assert!(event.links_rebuilt);
        assert_eq!(event.reason, RebuildReason::NodesChanged);
        assert_eq!(state.ticks_since_rebuild, 0);
        assert_eq!(state.topology.base_count(), 6);
    }

    #[test]
    fn test_stable_topology_retains_links() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let structure = StructuralConfig::spine_only();
        let topo = topology::generate(10, &structure, &mut rng);
        let links_before = topo.links.clone();
        let params = EvolutionParams {
            target_node_count: 10,
            target_link_count: 8,
            growth_rate: 0.0,
            pruning_rate: 0.0,
            link_stability: 1.0,
        };
        let mut state = EvolutionState::new(topo);
        for i in 1..=30 {
            let (next, event) = tick(state, &params, &structure, &quiet_config(), &mut rng);
            assert!(!event.nodes_changed);
            assert_eq!(event.reason, RebuildReason::Retained);
            assert_eq!(event.ticks_since_rebuild, i);
            state = next;
        }
        assert_eq!(state.topology.links, links_before);
    }

    #[test]
    fn test_retention_fallback_rebuilds() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let structure = StructuralConfig::spine_only();
        let mut topo = topology::generate(10, &structure, &mut rng);
        topo.links.truncate(2);
        let params = EvolutionParams {
            target_node_count: 10,
            target_link_count: 8,
            growth_rate: 0.0,
            pruning_rate: 0.0,
            link_stability: 1.0,
        };
        let (state, event) = tick(
            EvolutionState::new(topo),
            &params,
            &structure,
            &quiet_config(),
            &mut rng,
        );
        assert_eq!(event.reason, RebuildReason::RetentionFallback);
        assert_eq!(state.topology.links.len(), 8);
    }

    #[test]
    fn test_pruning_respects_min_nodes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let structure = StructuralConfig::spine_only();
        let mut scheduler = EvolutionScheduler::generate(6, &structure, &quiet_config(), &mut rng);
        scheduler.set_params(EvolutionParams {
            target_node_count: 6,
            target_link_count: 4,
            growth_rate: 0.0,
            pruning_rate: 1.0,
            link_stability: 0.5,
        });
        for _ in 0..20 {
            scheduler.tick(&mut rng);
        }
        assert_eq!(scheduler.topology().base_count(), 2);
    }

    #[test]
    fn test_scheduler_blends_toward_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let structure = StructuralConfig::spine_only();
        let mut scheduler = EvolutionScheduler::generate(6, &structure, &quiet_config(), &mut rng);
        let start = scheduler.params().link_stability;
        scheduler.set_target_params(EvolutionParams {
            link_stability: 0.0,
            ..scheduler.params().clone()
        });
        scheduler.tick(&mut rng);
        let after = scheduler.params().link_stability;
        assert!(after < start && after > 0.0);
    }
}
