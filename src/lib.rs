//! Headless runner for the helix network: wires topology generation, the
//! evolution scheduler and the animation engine to timers.

pub mod app;
pub mod error;
pub mod model;
