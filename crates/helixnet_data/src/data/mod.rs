//! Core data structures for the helix network.

pub mod graph;
