pub use helixnet_core::{EvolutionScheduler, FrameSample, OrganicAnimationEngine, TickEvent};
pub use helixnet_data::{Link, Node, NodeLayer, Topology, Vec3};
pub mod config {
    pub use helixnet_core::config::*;
}
pub mod topology {
    pub use helixnet_core::topology::*;
}
pub mod evolution {
    pub use helixnet_core::evolution::*;
}
pub mod animation {
    pub use helixnet_core::animation::*;
}
pub mod entity_state {
    pub use helixnet_core::entity_state::*;
}
pub mod buffers {
    pub use helixnet_core::buffers::*;
}
pub mod metrics {
    pub use helixnet_core::metrics::*;
}
