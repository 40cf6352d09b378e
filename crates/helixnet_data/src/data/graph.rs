use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Stable node identity. The only join key used by links and state caches.
pub type NodeId = String;

/// Role of a node inside the helix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeLayer {
    /// Leading base node of the helix.
    Input,
    /// Interior base node.
    Hidden,
    /// Trailing base node of the helix.
    Output,
    /// Auxiliary node placed between two cross-strand partners.
    Bridge,
    /// Auxiliary node in a short chain branching off a base node.
    SubStrand,
    /// Auxiliary jitter node around one of the helix extremities.
    EndNoise,
    /// Free auxiliary node orbiting the helix.
    Floating,
}

impl NodeLayer {
    /// Base nodes make up the strands; everything else is auxiliary.
    pub fn is_base(self) -> bool {
        matches!(self, NodeLayer::Input | NodeLayer::Hidden | NodeLayer::Output)
    }
}

/// A node in the helix network.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Activation level in `[0, 1]`.
    pub activation: f32,
    pub active: bool,
    pub layer: NodeLayer,
    /// Anchor for sub-strand and end-noise nodes.
    pub parent_id: Option<NodeId>,
    /// First partner of a bridge node.
    pub parent_a: Option<NodeId>,
    /// Second partner of a bridge node.
    pub parent_b: Option<NodeId>,
    /// When set, `position` is authoritative and only drifts slightly.
    pub force_position: bool,
    pub position: Option<Vec3>,
}

impl Node {
    /// A base node positioned by index along the helix.
    pub fn base(id: impl Into<NodeId>, layer: NodeLayer) -> Self {
        Self {
            id: id.into(),
            activation: 0.5,
            active: true,
            layer,
            parent_id: None,
            parent_a: None,
            parent_b: None,
            force_position: false,
            position: None,
        }
    }

    /// An auxiliary node with authoritative coordinates.
    pub fn auxiliary(id: impl Into<NodeId>, layer: NodeLayer, position: Vec3) -> Self {
        Self {
            id: id.into(),
            activation: 0.3,
            active: true,
            layer,
            parent_id: None,
            parent_a: None,
            parent_b: None,
            force_position: true,
            position: Some(position),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_partners(mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> Self {
        self.parent_a = Some(a.into());
        self.parent_b = Some(b.into());
        self
    }

    /// True if any parent reference points at `id`.
    pub fn depends_on(&self, id: &str) -> bool {
        [&self.parent_id, &self.parent_a, &self.parent_b]
            .into_iter()
            .any(|p| p.as_deref() == Some(id))
    }
}

/// Unordered node pair, smaller id first.
pub type PairKey = (NodeId, NodeId);

/// A weighted undirected connection between two nodes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
    pub active: bool,
}

impl Link {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, weight: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
            active: true,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn pair_key(&self) -> PairKey {
        pair_key(&self.source, &self.target)
    }

    /// Id used to key per-link animation state.
    pub fn state_key(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}

/// Builds the unordered key for a node pair.
pub fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// A node set together with the links between them.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn base_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.layer.is_base())
    }

    pub fn base_count(&self) -> usize {
        self.base_nodes().count()
    }

    pub fn auxiliary_count(&self) -> usize {
        self.nodes.len() - self.base_count()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Drops links whose endpoints are no longer present. Returns how many were removed.
    pub fn retain_valid_links(&mut self) -> usize {
        let ids: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let before = self.links.len();
        self.links
            .retain(|l| !l.is_self_loop() && ids.contains(&l.source) && ids.contains(&l.target));
        before - self.links.len()
    }

    /// Link count per node id. Nodes without links map to zero.
    pub fn degree_map(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        for link in &self.links {
            if let Some(d) = degrees.get_mut(link.source.as_str()) {
                *d += 1;
            }
            if let Some(d) = degrees.get_mut(link.target.as_str()) {
                *d += 1;
            }
        }
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        let a = Link::new("n1", "n2", 1.0);
        let b = Link::new("n2", "n1", 0.5);
        assert_eq!(a.pair_key(), b.pair_key());
    }

    #[test]
    fn test_retain_valid_links_drops_dangling() {
        let mut topo = Topology::new(
            vec![
                Node::base("n0", NodeLayer::Input),
                Node::base("n1", NodeLayer::Hidden),
            ],
            vec![
                Link::new("n0", "n1", 1.0),
                Link::new("n1", "gone", 1.0),
                Link::new("n0", "n0", 1.0),
            ],
        );
        assert_eq!(topo.retain_valid_links(), 2);
        assert_eq!(topo.links.len(), 1);
    }

    #[test]
    fn test_depends_on_checks_all_parents() {
        let bridge = Node::auxiliary("b", NodeLayer::Bridge, Vec3::ZERO).with_partners("n0", "n1");
        assert!(bridge.depends_on("n1"));
        assert!(!bridge.depends_on("n2"));
        let sub = Node::auxiliary("s", NodeLayer::SubStrand, Vec3::ZERO).with_parent("n2");
        assert!(sub.depends_on("n2"));
    }

    #[test]
    fn test_layer_serializes_kebab_case() {
        let json = serde_json::to_string(&NodeLayer::EndNoise).unwrap();
        assert_eq!(json, "\"end-noise\"");
    }

    #[test]
    fn test_forced_position_survives_serde() {
        let node = Node::auxiliary("float-0", NodeLayer::Floating, Vec3::new(1.5, -2.0, 0.25));
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.position, Some(Vec3::new(1.5, -2.0, 0.25)));
        assert_eq!(back, node);
    }
}
