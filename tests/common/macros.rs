/// Asserts that every link of the topology references a live node.
#[macro_export]
macro_rules! assert_no_dangling_links {
    ($topology:expr) => {
        let ids = $topology.node_ids();
        for link in &$topology.links {
            assert!(
                ids.contains(link.source.as_str()) && ids.contains(link.target.as_str()),
                "Link {}-{} references a missing node",
                link.source,
                link.target
            );
        }
    };
}

/// Asserts that no link is a self-loop and no unordered pair repeats.
#[macro_export]
macro_rules! assert_simple_graph {
    ($topology:expr) => {
        let mut seen = std::collections::HashSet::new();
        for link in &$topology.links {
            assert_ne!(link.source, link.target, "Self-loop on {}", link.source);
            assert!(
                seen.insert(link.pair_key()),
                "Duplicate pair {}-{}",
                link.source,
                link.target
            );
        }
    };
}

/// Asserts that every node has at least `min` links, capped by what the
/// node count allows.
#[macro_export]
macro_rules! assert_min_degree {
    ($topology:expr, $min:expr) => {
        let min: usize = $min;
        let total = $topology.nodes.len();
        let floor = if total < 2 { 0 } else { min.min(total - 1) };
        let degrees = $topology.degree_map();
        for node in &$topology.nodes {
            let degree = degrees.get(node.id.as_str()).copied().unwrap_or(0);
            assert!(
                degree >= floor,
                "Node {} has degree {} below {}",
                node.id,
                degree,
                floor
            );
        }
    };
}
