//! Plain value types shared by the helix topology core and its collaborators.

pub mod data;

pub use data::graph::{pair_key, Link, Node, NodeId, NodeLayer, PairKey, Topology};
pub use glam::Vec3;
