//! Topology generation for the double-helix network.
//!
//! [`generate`] builds base nodes, auxiliary families and a layered link
//! set from a [`StructuralConfig`]. [`build_links`] is the link step on its
//! own; the evolution scheduler calls it on every rebuild.
//!
//! Randomness only affects cosmetic choices. The spine is unconditional, so
//! every strand is always a connected path.

pub mod analysis;
pub mod auxiliary;
pub mod helix;
pub mod links;

use crate::config::{LayerConfig, StructuralConfig, MAX_NODES};
use helixnet_data::{Link, Node, NodeLayer, Topology};
use links::{LinkSet, StrandLayout};
use rand::Rng;

pub use helix::{estimate_helix_position, helix_coordinate, HelixCoordinate};

/// Id of the base node with the given serial.
pub fn base_node_id(serial: u64) -> String {
    format!("n{serial}")
}

fn io_edge(count: usize, layers: &LayerConfig) -> usize {
    ((count as f32 * layers.io_fraction).ceil() as usize).min(count / 2)
}

fn base_layer(index: usize, count: usize, edge: usize) -> NodeLayer {
    if index < edge {
        NodeLayer::Input
    } else if index >= count - edge {
        NodeLayer::Output
    } else {
        NodeLayer::Hidden
    }
}

/// Creates `count` base nodes, tagging the leading ones `input` and the
/// trailing ones `output`.
pub fn create_base_nodes(count: usize, layers: &LayerConfig) -> Vec<Node> {
    let count = count.min(MAX_NODES);
    let edge = io_edge(count, layers);
    (0..count)
        .map(|i| Node::base(base_node_id(i as u64), base_layer(i, count, edge)))
        .collect()
}

/// Re-applies input/output tagging to the base nodes in order, after growth
/// or pruning moved the helix ends. Auxiliary nodes are untouched.
pub fn retag_base_nodes(nodes: &mut [Node], layers: &LayerConfig) {
    let count = nodes.iter().filter(|n| n.layer.is_base()).count();
    let edge = io_edge(count, layers);
    for (i, node) in nodes.iter_mut().filter(|n| n.layer.is_base()).enumerate() {
        node.layer = base_layer(i, count, edge);
    }
}

/// Runs every enabled auxiliary family against the current base nodes.
/// Returns the number of nodes added.
pub fn spawn_auxiliary<R: Rng>(
    nodes: &mut Vec<Node>,
    config: &StructuralConfig,
    rng: &mut R,
) -> usize {
    auxiliary::spawn_bridges(nodes, config, rng)
        + auxiliary::spawn_sub_strands(nodes, config, rng)
        + auxiliary::spawn_end_noise(nodes, config, 0, rng)
        + auxiliary::spawn_floating(nodes, config, config.floating.count, rng)
}

/// Builds the full link set for `nodes`.
///
/// `target_link_count` pads or truncates the result. Truncation never
/// touches spine, attachment or connectivity links, and never drops a node
/// below the connectivity minimum.
pub fn build_links<R: Rng>(
    nodes: &[Node],
    target_link_count: Option<usize>,
    config: &StructuralConfig,
    rng: &mut R,
) -> Vec<Link> {
    if nodes.len() < 2 {
        return Vec::new();
    }
    let base: Vec<&Node> = nodes.iter().filter(|n| n.layer.is_base()).collect();
    let layout = StrandLayout::new(&base, config.helix.strand_count);
    let positions = links::estimated_positions(nodes, config);
    let mut set = LinkSet::new();

    links::add_spine(&mut set, &layout);
    if config.grouping.enabled {
        links::add_grouping(&mut set, &layout, config, rng);
    }
    if config.cross_strand.enabled {
        links::add_cross_strand(&mut set, &layout, config);
    }
    if config.spider_web.enabled {
        links::add_spider_web(&mut set, &layout, config, rng);
    }
    links::add_auxiliary_attachments(&mut set, nodes, &positions, config);
    if config.random_links.enabled {
        links::add_random(&mut set, nodes, config, rng);
    }
    if config.proximity.enabled {
        links::add_proximity(&mut set, nodes, &positions, config);
    }
    if config.connectivity.enabled {
        links::ensure_connectivity(&mut set, nodes, config, rng);
    }
    if let Some(target) = target_link_count {
        if set.len() > target {
            set.truncate_to(target, links::min_degree(nodes, config));
        } else {
            links::pad_to(&mut set, nodes, target, config, rng);
        }
    }
    set.into_links()
}

/// Builds a complete topology of `node_count` base nodes plus auxiliaries.
pub fn generate<R: Rng>(node_count: usize, config: &StructuralConfig, rng: &mut R) -> Topology {
    let config = config.sanitized();
    let mut nodes = create_base_nodes(node_count, &config.layers);
    let auxiliary = spawn_auxiliary(&mut nodes, &config, rng);
    let links = build_links(&nodes, config.budget.target_link_count, &config, rng);
    let topology = Topology::new(nodes, links);

    tracing::debug!(
        base = topology.base_count(),
        auxiliary,
        links = topology.links.len(),
        components = analysis::connected_components(&topology),
        "Topology generated"
    );
    topology
}
