//! Layered link construction.
//!
//! Every pass writes through a [`LinkSet`], which rejects self-loops and
//! repeated unordered pairs and stops at `MAX_EDGES`. Links from the spine,
//! auxiliary attachment and connectivity passes are protected: budget
//! truncation never removes them.

use super::helix::{estimate_helix_position, rung_count};
use crate::config::{StructuralConfig, MAX_EDGES};
use helixnet_data::{pair_key, Link, Node, NodeLayer, PairKey, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Link accumulator with duplicate and capacity guards.
#[derive(Debug, Default)]
pub struct LinkSet {
    links: Vec<Link>,
    protected: Vec<bool>,
    seen: HashSet<PairKey>,
    degrees: HashMap<String, usize>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an undirected link. Returns false for self-loops, repeats, or when full.
    pub fn add(&mut self, source: &str, target: &str, weight: f32, protected: bool) -> bool {
        if source == target || self.links.len() >= MAX_EDGES {
            return false;
        }
        if !self.seen.insert(pair_key(source, target)) {
            return false;
        }
        self.links.push(Link::new(source, target, weight));
        self.protected.push(protected);
        *self.degrees.entry(source.to_string()).or_insert(0) += 1;
        *self.degrees.entry(target.to_string()).or_insert(0) += 1;
        true
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.seen.contains(&pair_key(a, b))
    }

    pub fn degree(&self, id: &str) -> usize {
        self.degrees.get(id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn protected_count(&self) -> usize {
        self.protected.iter().filter(|p| **p).count()
    }

    /// Removes unprotected links, newest first, until `target` is reached.
    ///
    /// A link is kept when removing it would leave either endpoint with
    /// fewer than `min_degree` links.
    pub fn truncate_to(&mut self, target: usize, min_degree: usize) {
        let mut excess = self.links.len().saturating_sub(target);
        let mut idx = self.links.len();
        while excess > 0 && idx > 0 {
            idx -= 1;
            if self.protected[idx] {
                continue;
            }
            let link = &self.links[idx];
            if self.degree(&link.source) <= min_degree || self.degree(&link.target) <= min_degree {
                continue;
            }
            let link = self.links.remove(idx);
            self.protected.remove(idx);
            self.seen.remove(&link.pair_key());
            for end in [&link.source, &link.target] {
                if let Some(d) = self.degrees.get_mut(end.as_str()) {
                    *d = d.saturating_sub(1);
                }
            }
            excess -= 1;
        }
    }

    pub fn into_links(self) -> Vec<Link> {
        self.links
    }
}

/// Base node ids laid out by strand and rung.
pub(crate) struct StrandLayout<'a> {
    ids: Vec<&'a str>,
    strands: usize,
}

impl<'a> StrandLayout<'a> {
    pub(crate) fn new(base: &[&'a Node], strand_count: usize) -> Self {
        Self {
            ids: base.iter().map(|n| n.id.as_str()).collect(),
            strands: strand_count.max(1),
        }
    }

    pub(crate) fn at(&self, rung: usize, strand: usize) -> Option<&'a str> {
        if strand >= self.strands {
            return None;
        }
        self.ids.get(rung * self.strands + strand).copied()
    }

    pub(crate) fn rungs(&self) -> usize {
        if self.ids.is_empty() {
            0
        } else {
            rung_count(self.ids.len(), self.strands)
        }
    }

    /// Members of one strand in rung order.
    pub(crate) fn strand(&self, strand: usize) -> Vec<&'a str> {
        self.ids
            .iter()
            .skip(strand)
            .step_by(self.strands)
            .copied()
            .collect()
    }
}

/// Links each strand consecutively. Unconditional, so each strand is a path.
pub(crate) fn add_spine(set: &mut LinkSet, layout: &StrandLayout<'_>) {
    for s in 0..layout.strands {
        for pair in layout.strand(s).windows(2) {
            set.add(pair[0], pair[1], 1.0, true);
        }
    }
}

pub(crate) fn add_grouping<R: Rng>(
    set: &mut LinkSet,
    layout: &StrandLayout<'_>,
    config: &StructuralConfig,
    rng: &mut R,
) {
    let g = &config.grouping;
    for s in 0..layout.strands {
        let members = layout.strand(s);
        let mut prev_anchor: Option<&str> = None;
        for group in members.chunks(g.group_size.max(1)) {
            let anchor = group[0];
            for member in &group[1..] {
                if rng.gen::<f32>() < g.intra_link_density {
                    set.add(anchor, member, g.intra_weight, false);
                }
            }
            if let Some(prev) = prev_anchor {
                set.add(prev, anchor, g.anchor_weight, false);
            }
            prev_anchor = Some(anchor);
        }
    }
}

/// Base-pair rungs between adjacent strands, plus optional offset diagonals.
pub(crate) fn add_cross_strand(
    set: &mut LinkSet,
    layout: &StrandLayout<'_>,
    config: &StructuralConfig,
) {
    if layout.strands < 2 {
        return;
    }
    let c = &config.cross_strand;
    for rung in 0..layout.rungs() {
        for s in 0..layout.strands {
            let next = (s + 1) % layout.strands;
            let Some(a) = layout.at(rung, s) else {
                continue;
            };
            if let Some(b) = layout.at(rung, next) {
                set.add(a, b, c.rung_weight, false);
            }
            if c.diagonal {
                if let Some(d) = layout.at(rung + 1, next) {
                    set.add(a, d, c.diagonal_weight, false);
                }
            }
        }
    }
}

pub(crate) fn add_spider_web<R: Rng>(
    set: &mut LinkSet,
    layout: &StrandLayout<'_>,
    config: &StructuralConfig,
    rng: &mut R,
) {
    let web = &config.spider_web;
    let strands = layout.strands;
    for rung in 0..layout.rungs() {
        for s in 0..strands {
            let Some(a) = layout.at(rung, s) else {
                continue;
            };
            if strands > 1 {
                for k in 1..=web.ring_neighbors.min(strands - 1) {
                    if rng.gen::<f32>() < web.skip_chance {
                        continue;
                    }
                    if let Some(b) = layout.at(rung, (s + k) % strands) {
                        set.add(a, b, web.weight.sample(rng), false);
                    }
                }
            }
            for span in 1..=web.diagonal_span {
                if rng.gen::<f32>() < web.skip_chance {
                    continue;
                }
                if let Some(b) = layout.at(rung + span, (s + span) % strands) {
                    set.add(a, b, web.weight.sample(rng), false);
                }
            }
        }
    }
}

/// Attaches auxiliary nodes to their parents and chains.
pub(crate) fn add_auxiliary_attachments(
    set: &mut LinkSet,
    nodes: &[Node],
    positions: &[Vec3],
    config: &StructuralConfig,
) {
    let present: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let base: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.layer.is_base())
        .map(|(i, _)| i)
        .collect();
    let mut chain_tail: HashMap<&str, &str> = HashMap::new();

    for (i, node) in nodes.iter().enumerate() {
        match node.layer {
            NodeLayer::Bridge => {
                for partner in [&node.parent_a, &node.parent_b].into_iter().flatten() {
                    if present.contains(partner.as_str()) {
                        set.add(&node.id, partner, config.bridge.weight, true);
                    }
                }
            }
            NodeLayer::SubStrand => {
                let Some(parent) = node.parent_id.as_deref() else {
                    continue;
                };
                if !present.contains(parent) {
                    continue;
                }
                let prev = chain_tail.get(parent).copied().unwrap_or(parent);
                set.add(prev, &node.id, config.sub_strand.weight, true);
                chain_tail.insert(parent, node.id.as_str());
            }
            NodeLayer::EndNoise => {
                if let Some(anchor) = node.parent_id.as_deref() {
                    if present.contains(anchor) {
                        set.add(anchor, &node.id, config.end_noise.weight, true);
                    }
                }
            }
            NodeLayer::Floating => {
                let nearest = base.iter().copied().min_by(|&a, &b| {
                    let da = positions[a].distance(positions[i]);
                    let db = positions[b].distance(positions[i]);
                    da.total_cmp(&db)
                });
                if let Some(j) = nearest {
                    set.add(&nodes[j].id, &node.id, config.floating.weight, true);
                }
            }
            NodeLayer::Input | NodeLayer::Hidden | NodeLayer::Output => {}
        }
    }
}

pub(crate) fn add_random<R: Rng>(
    set: &mut LinkSet,
    nodes: &[Node],
    config: &StructuralConfig,
    rng: &mut R,
) {
    if nodes.len() < 2 {
        return;
    }
    let count = (nodes.len() as f32 * config.random_links.fraction).round() as usize;
    for _ in 0..count {
        let a = rng.gen_range(0..nodes.len());
        let b = rng.gen_range(0..nodes.len());
        set.add(
            &nodes[a].id,
            &nodes[b].id,
            config.random_links.weight.sample(rng),
            false,
        );
    }
}

/// Links nodes closer than the threshold, scanning a sliding index window.
pub(crate) fn add_proximity(
    set: &mut LinkSet,
    nodes: &[Node],
    positions: &[Vec3],
    config: &StructuralConfig,
) {
    let p = &config.proximity;
    for i in 0..nodes.len() {
        let end = (i + 1 + p.window).min(nodes.len());
        for j in (i + 1)..end {
            if positions[i].distance(positions[j]) < p.distance_threshold {
                set.add(&nodes[i].id, &nodes[j].id, p.weight, false);
            }
        }
    }
}

/// Adds random links until every node reaches the minimum degree or the
/// attempt budget runs out.
pub(crate) fn ensure_connectivity<R: Rng>(
    set: &mut LinkSet,
    nodes: &[Node],
    config: &StructuralConfig,
    rng: &mut R,
) {
    let c = &config.connectivity;
    if nodes.len() < 2 {
        return;
    }
    let min_links = min_degree(nodes, config);
    let mut attempts = 0;
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.shuffle(rng);

    for &i in &order {
        while set.degree(&nodes[i].id) < min_links {
            if attempts >= c.max_attempts {
                tracing::debug!(attempts, "Connectivity attempt budget exhausted");
                return;
            }
            attempts += 1;
            let j = rng.gen_range(0..nodes.len());
            set.add(&nodes[i].id, &nodes[j].id, c.weight, true);
        }
    }
}

/// Degree floor the connectivity pass aims for, and truncation must not break.
pub(crate) fn min_degree(nodes: &[Node], config: &StructuralConfig) -> usize {
    if !config.connectivity.enabled || nodes.len() < 2 {
        return 0;
    }
    config.connectivity.min_links_per_node.min(nodes.len() - 1)
}

/// Pads with random pairs until `target` links exist or the attempt budget runs out.
pub(crate) fn pad_to<R: Rng>(
    set: &mut LinkSet,
    nodes: &[Node],
    target: usize,
    config: &StructuralConfig,
    rng: &mut R,
) {
    if nodes.len() < 2 {
        return;
    }
    let possible = nodes.len() * (nodes.len() - 1) / 2;
    let target = target.min(possible).min(MAX_EDGES);
    let mut budget = target.saturating_sub(set.len()) * config.budget.pad_attempts_per_link.max(1);
    while set.len() < target && budget > 0 {
        budget -= 1;
        let a = rng.gen_range(0..nodes.len());
        let b = rng.gen_range(0..nodes.len());
        set.add(
            &nodes[a].id,
            &nodes[b].id,
            config.budget.pad_weight.sample(rng),
            false,
        );
    }
}

/// Generation-time positions for every node: estimated helix placement for
/// base nodes, authoritative coordinates for forced ones.
pub fn estimated_positions(nodes: &[Node], config: &StructuralConfig) -> Vec<Vec3> {
    let total = nodes.iter().filter(|n| n.layer.is_base()).count();
    let mut base_index = 0;
    nodes
        .iter()
        .map(|node| {
            if node.layer.is_base() {
                let p = estimate_helix_position(base_index, total, &config.helix);
                base_index += 1;
                p
            } else {
                node.position.unwrap_or(Vec3::ZERO)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_set_rejects_self_loops_and_repeats() {
        let mut set = LinkSet::new();
        assert!(set.add("a", "b", 1.0, false));
        assert!(!set.add("b", "a", 1.0, false));
        assert!(!set.add("a", "a", 1.0, false));
        assert_eq!(set.len(), 1);
        assert_eq!(set.degree("a"), 1);
    }

    #[test]
    fn test_truncate_keeps_protected_links() {
        let mut set = LinkSet::new();
        set.add("a", "b", 1.0, true);
        set.add("a", "c", 1.0, false);
        set.add("b", "c", 1.0, true);
        set.add("c", "d", 1.0, false);
        set.truncate_to(1, 0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.protected_count(), 2);
        assert!(!set.contains("c", "d"));
        assert!(set.add("c", "d", 1.0, false));
    }

    #[test]
    fn test_truncate_keeps_links_holding_min_degree() {
        let mut set = LinkSet::new();
        set.add("a", "b", 1.0, true);
        set.add("b", "c", 1.0, false);
        set.add("c", "d", 1.0, false);
        set.add("a", "d", 1.0, false);

        set.truncate_to(0, 1);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a", "b"));
        assert!(set.contains("c", "d"));
        for id in ["a", "b", "c", "d"] {
            assert!(set.degree(id) >= 1, "{id} dropped below the floor");
        }

        set.truncate_to(0, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_min_degree_follows_connectivity_toggle() {
        let nodes: Vec<Node> = (0..3)
            .map(|i| Node::base(format!("n{i}"), NodeLayer::Hidden))
            .collect();
        let mut config = StructuralConfig::default();
        config.connectivity.min_links_per_node = 5;
        assert_eq!(min_degree(&nodes, &config), 2);
        config.connectivity.enabled = false;
        assert_eq!(min_degree(&nodes, &config), 0);
    }

    #[test]
    fn test_strand_layout_round_robin() {
        let nodes: Vec<Node> = (0..7)
            .map(|i| Node::base(format!("n{i}"), NodeLayer::Hidden))
            .collect();
        let refs: Vec<&Node> = nodes.iter().collect();
        let layout = StrandLayout::new(&refs, 3);
        assert_eq!(layout.strand(0), vec!["n0", "n3", "n6"]);
        assert_eq!(layout.strand(2), vec!["n2", "n5"]);
        assert_eq!(layout.rungs(), 3);
        assert_eq!(layout.at(2, 1), None);
    }
}
