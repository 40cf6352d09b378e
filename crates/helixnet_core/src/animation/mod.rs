//! Per-frame organic animation.
//!
//! [`OrganicAnimationEngine::sample`] reads the live topology and produces a
//! [`FrameSample`]: smoothed node positions, colors and sizes plus sampled
//! link curves. The engine never mutates the topology. It owns the
//! per-entity state cache and the smoothing buffers, both keyed by id, and
//! evicts entries for entities that left the graph.

pub mod color;
pub mod curve;
pub mod position;

use crate::config::{AnimationConfig, HelixConfig, MAX_EDGES, MAX_NODES};
use crate::entity_state::EntityStateCache;
use crate::topology::helix_coordinate;
use color::{ColorInput, Rgb};
use helixnet_data::{Node, NodeId, Topology, Vec3};
use std::collections::{HashMap, HashSet};

/// Fraction of the remaining distance covered in `dt` seconds.
///
/// `decay_base` is the fraction left after one second, so the result does
/// not depend on how a span of time is split into frames.
pub fn smoothing_factor(decay_base: f32, dt: f32) -> f32 {
    if dt <= 0.0 || !dt.is_finite() {
        return 0.0;
    }
    (1.0 - decay_base.powf(dt)).clamp(0.0, 1.0)
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSample {
    pub node_ids: Vec<NodeId>,
    pub node_positions: Vec<[f32; 3]>,
    pub node_colors: Vec<Rgb>,
    pub node_sizes: Vec<f32>,
    /// `points_per_link` consecutive points per rendered link.
    pub link_points: Vec<[f32; 3]>,
    pub link_colors: Vec<Rgb>,
    pub link_count: usize,
    pub points_per_link: usize,
}

impl FrameSample {
    fn clear(&mut self) {
        self.node_ids.clear();
        self.node_positions.clear();
        self.node_colors.clear();
        self.node_sizes.clear();
        self.link_points.clear();
        self.link_colors.clear();
        self.link_count = 0;
    }

    pub fn node_count(&self) -> usize {
        self.node_positions.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Smoothed {
    position: Vec3,
    color: Rgb,
    size: f32,
}

impl Smoothed {
    fn approach(&mut self, target: &Smoothed, k: f32) {
        self.position = self.position.lerp(target.position, k);
        self.color = color::lerp_rgb(self.color, target.color, k);
        self.size += (target.size - self.size) * k;
    }
}

#[derive(Debug)]
pub struct OrganicAnimationEngine {
    config: AnimationConfig,
    helix: HelixConfig,
    cache: EntityStateCache,
    buffers: HashMap<NodeId, Smoothed>,
    frame: FrameSample,
    evictions: u64,
}

impl OrganicAnimationEngine {
    pub fn new(config: &AnimationConfig, helix: &HelixConfig) -> Self {
        let config = config.sanitized();
        let points_per_link = config.links.segments + 1;
        Self {
            config,
            helix: helix.clone(),
            cache: EntityStateCache::new(),
            buffers: HashMap::new(),
            frame: FrameSample {
                points_per_link,
                ..Default::default()
            },
            evictions: 0,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn cache(&self) -> &EntityStateCache {
        &self.cache
    }

    /// Entries dropped from the state cache so far.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Smoothed position of `id` as of the last frame.
    pub fn smoothed_position(&self, id: &str) -> Option<Vec3> {
        self.buffers.get(id).map(|s| s.position)
    }

    /// Unsmoothed targets of every node at `time`, in node order.
    pub fn targets(&mut self, topology: &Topology, time: f32) -> Vec<Vec3> {
        self.node_targets(&topology.nodes, time)
            .into_iter()
            .map(|s| s.position)
            .collect()
    }

    fn node_targets(&mut self, nodes: &[Node], time: f32) -> Vec<Smoothed> {
        let nodes = &nodes[..nodes.len().min(MAX_NODES)];
        let base_total = nodes.iter().filter(|n| n.layer.is_base()).count();
        let last = nodes.len().saturating_sub(1).max(1) as f32;
        let organic = &self.config.organic;
        let mut base_index = 0;
        let mut out = Vec::with_capacity(nodes.len());

        for (i, node) in nodes.iter().enumerate() {
            let state = self.cache.node(&node.id);
            let position = match (node.force_position, node.position) {
                (true, Some(anchor)) => {
                    position::forced_target_position(anchor, &state, time, organic)
                }
                _ if node.layer.is_base() => {
                    let coord = helix_coordinate(base_index, base_total, &self.helix);
                    base_index += 1;
                    position::helix_target_position(
                        coord,
                        &state,
                        node.activation,
                        time,
                        &self.helix,
                        organic,
                    )
                }
                _ => position::forced_target_position(
                    node.position.unwrap_or(Vec3::ZERO),
                    &state,
                    time,
                    organic,
                ),
            };
            let color = color::node_color(
                &self.config.color,
                &state,
                ColorInput {
                    activation: node.activation,
                    active: node.active,
                    order: i as f32 / last,
                    time,
                },
            );
            let size =
                color::node_size(&self.config.size, &state, node.activation, node.active, time);
            out.push(Smoothed {
                position,
                color,
                size,
            });
        }
        out
    }

    /// Samples one frame at `time` seconds, `dt` seconds after the previous.
    ///
    /// Nodes seen for the first time snap to their target. Links with a
    /// missing endpoint are skipped.
    pub fn sample(&mut self, topology: &Topology, time: f32, dt: f32) -> &FrameSample {
        let k = smoothing_factor(self.config.smoothing.decay_base, dt);
        let targets = self.node_targets(&topology.nodes, time);
        self.frame.clear();

        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(targets.len());
        for (i, (node, target)) in topology.nodes.iter().zip(targets.iter()).enumerate() {
            let current = self
                .buffers
                .entry(node.id.clone())
                .and_modify(|s| s.approach(target, k))
                .or_insert(*target);
            self.frame.node_ids.push(node.id.clone());
            self.frame.node_positions.push(current.position.to_array());
            self.frame.node_colors.push(current.color);
            self.frame.node_sizes.push(current.size);
            index_of.insert(node.id.as_str(), i);
        }

        let dim = self.config.color.inactive_dim;
        for link in &topology.links {
            if self.frame.link_count >= MAX_EDGES {
                break;
            }
            let (Some(&a), Some(&b)) = (
                index_of.get(link.source.as_str()),
                index_of.get(link.target.as_str()),
            ) else {
                continue;
            };
            let state = self.cache.link(link);
            let brightness = if link.active { 1.0 } else { dim };
            let pa = self.frame.node_positions[a];
            let pb = self.frame.node_positions[b];
            curve::sample_link(
                Vec3::new(pa[0], pa[1], pa[2]),
                Vec3::new(pb[0], pb[1], pb[2]),
                &self.config.links,
                &state,
                brightness,
                time,
                &mut self.frame.link_points,
                &mut self.frame.link_colors,
            );
            self.frame.link_count += 1;
        }

        let live_nodes = index_of.len();
        if self.cache.node_count() > live_nodes
            || self.cache.link_count() > self.frame.link_count
            || self.buffers.len() > live_nodes
        {
            self.evict(topology, &index_of);
        }
        &self.frame
    }

    fn evict(&mut self, topology: &Topology, live: &HashMap<&str, usize>) {
        let live_nodes: HashSet<&str> = live.keys().copied().collect();
        let live_links: HashSet<String> = topology
            .links
            .iter()
            .filter(|l| {
                live.contains_key(l.source.as_str()) && live.contains_key(l.target.as_str())
            })
            .map(|l| l.state_key())
            .collect();
        let evicted = self.cache.evict(&live_nodes, &live_links);
        self.buffers.retain(|id, _| live_nodes.contains(id.as_str()));
        self.evictions += evicted as u64;
        tracing::debug!(evicted, cached = self.cache.len(), "Animation state evicted");
    }

    /// Latest frame without sampling a new one.
    pub fn frame(&self) -> &FrameSample {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StructuralConfig;
    use crate::topology;
    use helixnet_data::Link;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> OrganicAnimationEngine {
        OrganicAnimationEngine::new(&AnimationConfig::default(), &HelixConfig::default())
    }

    fn topo(n: usize) -> Topology {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        topology::generate(n, &StructuralConfig::default(), &mut rng)
    }

    #[test]
    fn test_smoothing_factor_bounds() {
        assert_eq!(smoothing_factor(0.002, 0.0), 0.0);
        assert_eq!(smoothing_factor(0.002, -1.0), 0.0);
        assert!((smoothing_factor(0.002, 1.0) - 0.998).abs() < 1e-6);
        let k = smoothing_factor(0.002, 0.016);
        assert!(k > 0.0 && k < 0.2);
    }

    #[test]
    fn test_smoothing_is_frame_rate_independent() {
        let once = 1.0 - smoothing_factor(0.002, 0.032);
        let twice = (1.0 - smoothing_factor(0.002, 0.016)).powi(2);
        assert!((once - twice).abs() < 1e-5);
    }

    #[test]
    fn test_first_frame_snaps_to_targets() {
        let topology = topo(20);
        let mut engine = engine();
        let targets = engine.targets(&topology, 1.0);
        let frame = engine.sample(&topology, 1.0, 0.016);
        for (p, t) in frame.node_positions.iter().zip(targets.iter()) {
            assert_eq!(*p, t.to_array());
        }
    }

    #[test]
    fn test_link_samples_have_fixed_stride() {
        let topology = topo(30);
        let mut engine = engine();
        let frame = engine.sample(&topology, 0.0, 0.016);
        assert_eq!(frame.link_count, topology.links.len());
        assert_eq!(frame.link_points.len(), frame.link_count * frame.points_per_link);
        assert_eq!(frame.link_colors.len(), frame.link_points.len());
    }

    #[test]
    fn test_dangling_links_are_skipped() {
        let mut topology = topo(10);
        let valid = topology.links.len();
        topology.links.push(Link::new("n0", "ghost", 0.5));
        let mut engine = engine();
        assert_eq!(engine.sample(&topology, 0.0, 0.016).link_count, valid);
    }

    #[test]
    fn test_removed_nodes_are_evicted() {
        let mut topology = topo(12);
        let mut engine = engine();
        engine.sample(&topology, 0.0, 0.016);
        assert!(engine.smoothed_position("n11").is_some());

        topology.nodes.retain(|n| n.id != "n11" && !n.depends_on("n11"));
        topology.retain_valid_links();
        engine.sample(&topology, 0.016, 0.016);
        assert!(engine.smoothed_position("n11").is_none());
        assert!(engine.evictions() > 0);
        assert_eq!(engine.cache().node_count(), topology.nodes.len());
        assert_eq!(engine.cache().link_count(), topology.links.len());
    }

    #[test]
    fn test_sampling_does_not_touch_topology() {
        let topology = topo(16);
        let before = topology.clone();
        let mut engine = engine();
        for frame in 0..10 {
            engine.sample(&topology, frame as f32 * 0.016, 0.016);
        }
        assert_eq!(topology, before);
    }
}
