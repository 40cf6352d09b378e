//! # Helixnet Core
//!
//! The engine behind a living double-helix neural graph.
//!
//! This crate contains:
//! - Topology generation: strands, spine, cross-strand rungs, spider web,
//!   auxiliary node families and density passes
//! - The evolution scheduler: pulse, growth, pruning and the link rebuild policy
//! - The organic animation engine: per-frame positions, colors, sizes and
//!   link curves with frame-rate independent smoothing
//! - Deterministic per-entity animation state derived from ids
//! - Render buffer sync, metrics and structured logging
//!
//! Randomness is always injected as `&mut impl Rng`; nothing in the core
//! draws from an ambient source.
//!
//! ## Example
//!
//! ```
//! use helixnet_core::config::{AnimationConfig, EvolutionConfig, StructuralConfig};
//! use helixnet_core::{EvolutionScheduler, OrganicAnimationEngine};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let structure = StructuralConfig::default();
//! let mut scheduler =
//!     EvolutionScheduler::generate(24, &structure, &EvolutionConfig::default(), &mut rng);
//! let mut engine = OrganicAnimationEngine::new(&AnimationConfig::default(), &structure.helix);
//!
//! let event = scheduler.tick(&mut rng);
//! let frame = engine.sample(scheduler.topology(), 0.016, 0.016);
//! assert_eq!(frame.node_count(), event.node_count);
//! ```

pub mod animation;
pub mod buffers;
pub mod config;
pub mod entity_state;
pub mod evolution;
pub mod metrics;
pub mod topology;

pub use animation::{FrameSample, OrganicAnimationEngine};
pub use buffers::{BufferSync, RenderBuffers};
pub use entity_state::{EntityStateCache, LinkEntityState, NodeEntityState};
pub use evolution::{EvolutionScheduler, EvolutionState, RebuildReason, TickEvent};
pub use topology::generate;
