//! Per-entity animation parameters derived purely from identity strings.
//!
//! Every value here is a function of the id alone, so dropping and
//! rebuilding the cache reproduces the same phases and rates. That keeps
//! the smoothing buffers continuous across topology changes.

use helixnet_data::{Link, NodeId};
use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

/// 64-bit FNV-1a over the identity bytes.
pub fn hash_id(id: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3_u64);
    }
    hash
}

fn mix(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Uniform value in `[0, 1)` for the given salt.
fn unit(seed: u64, salt: u64) -> f32 {
    (mix(seed, salt) >> 40) as f32 / (1u64 << 24) as f32
}

fn in_range(seed: u64, salt: u64, min: f32, max: f32) -> f32 {
    min + (max - min) * unit(seed, salt)
}

/// Fixed animation constants of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEntityState {
    pub seed: u64,
    pub breathing_rate: f32,
    pub breathing_phase: f32,
    pub pulse_rate: f32,
    pub pulse_phase: f32,
    pub drift_rate: f32,
    pub drift_phase: [f32; 3],
    pub orbit_phase: f32,
    pub orbit_speed: f32,
    pub morph_phase: f32,
    pub morph_speed: f32,
}

impl NodeEntityState {
    pub fn derive(id: &str) -> Self {
        let seed = hash_id(id);
        Self {
            seed,
            breathing_rate: in_range(seed, 1, 0.6, 1.4),
            breathing_phase: unit(seed, 2) * TAU,
            pulse_rate: in_range(seed, 3, 1.5, 3.5),
            pulse_phase: unit(seed, 4) * TAU,
            drift_rate: in_range(seed, 5, 0.2, 0.6),
            drift_phase: [
                unit(seed, 6) * TAU,
                unit(seed, 7) * TAU,
                unit(seed, 8) * TAU,
            ],
            orbit_phase: unit(seed, 9) * TAU,
            orbit_speed: in_range(seed, 10, 0.3, 0.9),
            morph_phase: unit(seed, 11) * TAU,
            morph_speed: in_range(seed, 12, 0.5, 1.5),
        }
    }
}

/// Fixed animation constants of one link, keyed by `source-target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEntityState {
    pub seed: u64,
    /// Which side of the link the curve bends toward.
    pub curvature_sign: f32,
    pub curvature_jitter: f32,
    pub flow_phase: f32,
    pub flow_speed_jitter: f32,
    pub wave_phase: f32,
}

impl LinkEntityState {
    pub fn derive(key: &str) -> Self {
        let seed = hash_id(key);
        Self {
            seed,
            curvature_sign: if unit(seed, 21) < 0.5 { -1.0 } else { 1.0 },
            curvature_jitter: in_range(seed, 22, 0.7, 1.3),
            flow_phase: unit(seed, 23),
            flow_speed_jitter: in_range(seed, 24, 0.8, 1.2),
            wave_phase: unit(seed, 25) * TAU,
        }
    }

    pub fn for_link(link: &Link) -> Self {
        Self::derive(&link.state_key())
    }
}

/// Lazily populated per-entity state, owned by the animation engine.
#[derive(Debug, Default)]
pub struct EntityStateCache {
    nodes: HashMap<NodeId, NodeEntityState>,
    links: HashMap<String, LinkEntityState>,
}

impl EntityStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, id: &str) -> NodeEntityState {
        if let Some(state) = self.nodes.get(id) {
            return *state;
        }
        let state = NodeEntityState::derive(id);
        self.nodes.insert(id.to_string(), state);
        state
    }

    pub fn link(&mut self, link: &Link) -> LinkEntityState {
        let key = link.state_key();
        if let Some(state) = self.links.get(&key) {
            return *state;
        }
        let state = LinkEntityState::derive(&key);
        self.links.insert(key, state);
        state
    }

    /// Drops state for nodes not in `live_nodes` and links not in `live_links`.
    /// Returns the number of evicted entries.
    pub fn evict(&mut self, live_nodes: &HashSet<&str>, live_links: &HashSet<String>) -> usize {
        let before = self.len();
        self.nodes.retain(|id, _| live_nodes.contains(id.as_str()));
        self.links.retain(|key, _| live_links.contains(key));
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.links.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }
}
