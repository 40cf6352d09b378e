//! Auxiliary node families: bridge, sub-strand, end-noise and floating.
//!
//! Each spawner is idempotent against the current node set, enforces its
//! family's `max_total_nodes` and the global `MAX_NODES`, and gives every
//! node authoritative coordinates from the generation-time helix estimate.

use super::helix::estimate_helix_position;
use super::links::StrandLayout;
use crate::config::{StructuralConfig, MAX_NODES};
use helixnet_data::{Node, NodeLayer, Vec3};
use rand::Rng;
use std::collections::HashSet;

fn family_count(nodes: &[Node], layer: NodeLayer) -> usize {
    nodes.iter().filter(|n| n.layer == layer).count()
}

fn base_positions(nodes: &[Node], config: &StructuralConfig) -> Vec<(String, Vec3)> {
    let base: Vec<&Node> = nodes.iter().filter(|n| n.layer.is_base()).collect();
    let total = base.len();
    base.iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), estimate_helix_position(i, total, &config.helix)))
        .collect()
}

fn random_unit<R: Rng>(rng: &mut R) -> Vec3 {
    for _ in 0..8 {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.length() <= 1.0 {
            if let Some(n) = v.try_normalize() {
                return n;
            }
        }
    }
    Vec3::Y
}

/// Places bridge nodes at the midpoint of same-rung cross-strand pairs.
pub fn spawn_bridges<R: Rng>(
    nodes: &mut Vec<Node>,
    config: &StructuralConfig,
    rng: &mut R,
) -> usize {
    let b = &config.bridge;
    if !b.enabled || config.helix.strand_count < 2 {
        return 0;
    }
    let mut count = family_count(nodes, NodeLayer::Bridge);
    let existing: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let positions = base_positions(nodes, config);
    let base: Vec<&Node> = nodes.iter().filter(|n| n.layer.is_base()).collect();
    let layout = StrandLayout::new(&base, config.helix.strand_count);
    let strands = config.helix.strand_count;

    let mut spawned = Vec::new();
    'rungs: for rung in 0..layout.rungs() {
        for s in 0..strands {
            if count >= b.max_total_nodes || nodes.len() + spawned.len() >= MAX_NODES {
                break 'rungs;
            }
            let (Some(a), Some(c)) = (layout.at(rung, s), layout.at(rung, (s + 1) % strands))
            else {
                continue;
            };
            let id = format!("bridge-{a}-{c}");
            let mirrored = format!("bridge-{c}-{a}");
            if existing.contains(&id) || existing.contains(&mirrored) {
                continue;
            }
            if spawned.iter().any(|n: &Node| n.id == id || n.id == mirrored) {
                continue;
            }
            if rng.gen::<f32>() >= b.chance {
                continue;
            }
            let pa = positions[rung * strands + s].1;
            let pc = positions[rung * strands + (s + 1) % strands].1;
            spawned.push(
                Node::auxiliary(id, NodeLayer::Bridge, pa.lerp(pc, 0.5)).with_partners(a, c),
            );
            count += 1;
        }
    }
    let added = spawned.len();
    nodes.extend(spawned);
    added
}

/// Grows short outward chains off base nodes that have no branch yet.
pub fn spawn_sub_strands<R: Rng>(
    nodes: &mut Vec<Node>,
    config: &StructuralConfig,
    rng: &mut R,
) -> usize {
    let sc = &config.sub_strand;
    if !sc.enabled {
        return 0;
    }
    let mut count = family_count(nodes, NodeLayer::SubStrand);
    let branched: HashSet<String> = nodes
        .iter()
        .filter(|n| n.layer == NodeLayer::SubStrand)
        .filter_map(|n| n.parent_id.clone())
        .collect();

    let mut spawned = Vec::new();
    for (parent, origin) in base_positions(nodes, config) {
        if branched.contains(&parent) {
            continue;
        }
        let room = sc
            .max_total_nodes
            .saturating_sub(count)
            .min(MAX_NODES.saturating_sub(nodes.len() + spawned.len()));
        if room == 0 {
            break;
        }
        if rng.gen::<f32>() >= sc.chance {
            continue;
        }
        let length = rng.gen_range(sc.min_length..=sc.max_length.max(sc.min_length)).min(room);
        let radial = Vec3::new(origin.x, 0.0, origin.z)
            .try_normalize()
            .unwrap_or(Vec3::X);
        let direction = (radial + random_unit(rng) * 0.35)
            .try_normalize()
            .unwrap_or(radial);
        for k in 0..length {
            let jitter = random_unit(rng) * (sc.spread * 0.2);
            let position = origin + direction * (sc.spread * (k + 1) as f32) + jitter;
            spawned.push(
                Node::auxiliary(format!("sub-{parent}-{k}"), NodeLayer::SubStrand, position)
                    .with_parent(parent.as_str()),
            );
        }
        count += length;
    }
    let added = spawned.len();
    nodes.extend(spawned);
    added
}

/// Scatters jitter nodes around both helix extremities.
///
/// `generation` is folded into the ids so a regenerated family never
/// reuses the identity of a previous one.
pub fn spawn_end_noise<R: Rng>(
    nodes: &mut Vec<Node>,
    config: &StructuralConfig,
    generation: u64,
    rng: &mut R,
) -> usize {
    let e = &config.end_noise;
    if !e.enabled {
        return 0;
    }
    let positions = base_positions(nodes, config);
    let (Some(bottom), Some(top)) = (positions.first().cloned(), positions.last().cloned()) else {
        return 0;
    };
    let mut count = family_count(nodes, NodeLayer::EndNoise);
    let mut spawned = Vec::new();
    for (end, (anchor, center)) in [("bottom", bottom), ("top", top)] {
        for k in 0..e.nodes_per_end {
            if count >= e.max_total_nodes || nodes.len() + spawned.len() >= MAX_NODES {
                break;
            }
            if rng.gen::<f32>() >= e.chance {
                continue;
            }
            let offset = Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ) * e.jitter;
            spawned.push(
                Node::auxiliary(
                    format!("noise-{end}-{generation}-{k}"),
                    NodeLayer::EndNoise,
                    center + offset,
                )
                .with_parent(anchor.as_str()),
            );
            count += 1;
        }
    }
    let added = spawned.len();
    nodes.extend(spawned);
    added
}

/// Appends up to `count` free nodes in a shell around the helix.
pub fn spawn_floating<R: Rng>(
    nodes: &mut Vec<Node>,
    config: &StructuralConfig,
    count: usize,
    rng: &mut R,
) -> usize {
    let f = &config.floating;
    if !f.enabled {
        return 0;
    }
    let room = f
        .max_total_nodes
        .saturating_sub(family_count(nodes, NodeLayer::Floating))
        .min(MAX_NODES.saturating_sub(nodes.len()));
    let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let half_height = config.helix.height * 0.5;
    let mut serial = 0usize;
    let mut added = 0;
    while added < count.min(room) {
        let mut id = format!("float-{serial}");
        while ids.contains(&id) {
            serial += 1;
            id = format!("float-{serial}");
        }
        serial += 1;
        let direction = random_unit(rng);
        let distance = config.helix.radius * f.shell.sample(rng);
        let mut position = direction * distance;
        position.y = position.y.clamp(-half_height * 1.1, half_height * 1.1);
        nodes.push(Node::auxiliary(id, NodeLayer::Floating, position));
        added += 1;
    }
    added
}

/// Removes every node of `layer`. Returns how many were removed.
pub fn remove_family(nodes: &mut Vec<Node>, layer: NodeLayer) -> usize {
    let before = nodes.len();
    nodes.retain(|n| n.layer != layer);
    before - nodes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::create_base_nodes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn base(n: usize) -> Vec<Node> {
        create_base_nodes(n, &StructuralConfig::default().layers)
    }

    #[test]
    fn test_bridges_are_idempotent_and_capped() {
        let mut config = StructuralConfig::default();
        config.bridge.chance = 1.0;
        config.bridge.max_total_nodes = 5;
        let mut nodes = base(20);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(spawn_bridges(&mut nodes, &config, &mut rng), 5);
        assert_eq!(spawn_bridges(&mut nodes, &config, &mut rng), 0);
        config.bridge.max_total_nodes = 100;
        // A double helix of 20 has 10 rungs; the wraparound pair is the same pair.
        assert_eq!(spawn_bridges(&mut nodes, &config, &mut rng), 5);
        for bridge in nodes.iter().filter(|n| n.layer == NodeLayer::Bridge) {
            assert!(bridge.force_position);
            assert!(bridge.parent_a.is_some() && bridge.parent_b.is_some());
        }
    }

    #[test]
    fn test_bridges_need_two_strands() {
        let mut config = StructuralConfig::default();
        config.helix.strand_count = 1;
        config.bridge.chance = 1.0;
        let mut nodes = base(10);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(spawn_bridges(&mut nodes, &config, &mut rng), 0);
    }

    #[test]
    fn test_sub_strands_one_branch_per_parent() {
        let mut config = StructuralConfig::default();
        config.sub_strand.chance = 1.0;
        config.sub_strand.max_total_nodes = 1000;
        config.sub_strand.min_length = 2;
        config.sub_strand.max_length = 2;
        let mut nodes = base(6);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(spawn_sub_strands(&mut nodes, &config, &mut rng), 12);
        assert_eq!(spawn_sub_strands(&mut nodes, &config, &mut rng), 0);
    }

    #[test]
    fn test_end_noise_anchors_at_extremities() {
        let mut config = StructuralConfig::default();
        config.end_noise.chance = 1.0;
        config.end_noise.nodes_per_end = 3;
        let mut nodes = base(10);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(spawn_end_noise(&mut nodes, &config, 0, &mut rng), 6);
        let anchors: HashSet<&str> = nodes
            .iter()
            .filter(|n| n.layer == NodeLayer::EndNoise)
            .filter_map(|n| n.parent_id.as_deref())
            .collect();
        assert_eq!(anchors, ["n0", "n9"].into_iter().collect());
    }

    #[test]
    fn test_end_noise_without_base_nodes_is_empty() {
        let mut nodes = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(
            spawn_end_noise(&mut nodes, &StructuralConfig::default(), 0, &mut rng),
            0
        );
    }

    #[test]
    fn test_floating_ids_stay_unique() {
        let mut config = StructuralConfig::default();
        config.floating.enabled = true;
        let mut nodes = base(4);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        spawn_floating(&mut nodes, &config, 3, &mut rng);
        spawn_floating(&mut nodes, &config, 3, &mut rng);
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), nodes.len());
        assert_eq!(family_count(&nodes, NodeLayer::Floating), 6);
    }
}
