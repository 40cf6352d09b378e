//! Graph diagnostics over a generated or evolved topology.

use helixnet_data::Topology;
use petgraph::graphmap::UnGraphMap;

fn graph_of(topology: &Topology) -> UnGraphMap<&str, f32> {
    let mut graph = UnGraphMap::new();
    for node in &topology.nodes {
        graph.add_node(node.id.as_str());
    }
    let ids = topology.node_ids();
    for link in &topology.links {
        if ids.contains(link.source.as_str()) && ids.contains(link.target.as_str()) {
            graph.add_edge(link.source.as_str(), link.target.as_str(), link.weight);
        }
    }
    graph
}

/// Number of connected components. Dangling links are ignored.
pub fn connected_components(topology: &Topology) -> usize {
    if topology.nodes.is_empty() {
        return 0;
    }
    petgraph::algo::connected_components(&graph_of(topology))
}

/// Ids of nodes with no valid link.
pub fn isolated_nodes(topology: &Topology) -> Vec<&str> {
    let graph = graph_of(topology);
    topology
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| graph.neighbors(id).next().is_none())
        .collect()
}
