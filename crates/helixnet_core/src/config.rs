//! Configuration management for topology, evolution and animation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! a `config.toml` file. Every section has a `Default`, and every field is
//! optional in the file.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults, validated by [`AppConfig::from_toml`])
//! 3. [`AppConfig::sanitized`] clamps whatever reaches the core at runtime
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [structure.helix]
//! radius = 8.0
//! strand_count = 2
//!
//! [structure.bridge]
//! enabled = true
//! chance = 0.35
//!
//! [evolution]
//! min_rebuild_interval = 10
//! retention_threshold = 0.6
//!
//! [animation.color]
//! mode = "energy"
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hard ceiling on live nodes across generation and evolution.
pub const MAX_NODES: usize = 2048;
/// Hard ceiling on live links across generation and evolution.
pub const MAX_EDGES: usize = 8192;

/// Inclusive numeric range sampled for cosmetic variance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RangeConfig {
    pub min: f32,
    pub max: f32,
}

impl RangeConfig {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    fn sanitized(self, name: &str, floor: f32) -> Self {
        let mut out = self;
        if !out.min.is_finite() || out.min < floor {
            out.min = floor;
        }
        if !out.max.is_finite() || out.max < out.min {
            out.max = out.min;
        }
        if out != self {
            tracing::warn!(field = name, original = ?self, clamped = ?out, "Range clamped");
        }
        out
    }
}

/// Helix geometry.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HelixConfig {
    pub radius: f32,
    pub height: f32,
    pub turns: f32,
    pub strand_count: usize,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            height: 30.0,
            turns: 2.5,
            strand_count: 2,
        }
    }
}

/// Input/output tagging of base nodes.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LayerConfig {
    /// Fraction of base nodes tagged `input` at the start and `output` at the end.
    pub io_fraction: f32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { io_fraction: 0.1 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GroupingConfig {
    pub enabled: bool,
    pub group_size: usize,
    pub intra_link_density: f32,
    pub intra_weight: f32,
    pub anchor_weight: f32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            group_size: 4,
            intra_link_density: 0.6,
            intra_weight: 0.6,
            anchor_weight: 0.8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CrossStrandConfig {
    pub enabled: bool,
    pub rung_weight: f32,
    pub diagonal: bool,
    pub diagonal_weight: f32,
}

impl Default for CrossStrandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rung_weight: 0.9,
            diagonal: true,
            diagonal_weight: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SpiderWebConfig {
    pub enabled: bool,
    pub ring_neighbors: usize,
    pub diagonal_span: usize,
    pub skip_chance: f32,
    pub weight: RangeConfig,
}

impl Default for SpiderWebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ring_neighbors: 2,
            diagonal_span: 2,
            skip_chance: 0.3,
            weight: RangeConfig::new(0.2, 0.5),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BridgeConfig {
    pub enabled: bool,
    /// Chance per cross-strand pair of spawning a bridge node.
    pub chance: f32,
    pub max_total_nodes: usize,
    pub weight: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.35,
            max_total_nodes: 40,
            weight: 0.7,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SubStrandConfig {
    pub enabled: bool,
    /// Chance per base node of growing a branch.
    pub chance: f32,
    pub min_length: usize,
    pub max_length: usize,
    /// Distance between consecutive branch nodes.
    pub spread: f32,
    pub max_total_nodes: usize,
    pub weight: f32,
}

impl Default for SubStrandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.15,
            min_length: 2,
            max_length: 4,
            spread: 1.5,
            max_total_nodes: 60,
            weight: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EndNoiseConfig {
    pub enabled: bool,
    pub nodes_per_end: usize,
    /// Chance per candidate node at generation time.
    pub chance: f32,
    pub jitter: f32,
    /// Chance per evolution tick of regenerating the whole family.
    pub spawn_chance: f32,
    pub max_total_nodes: usize,
    pub weight: f32,
}

impl Default for EndNoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nodes_per_end: 6,
            chance: 0.6,
            jitter: 2.5,
            spawn_chance: 0.1,
            max_total_nodes: 16,
            weight: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FloatingConfig {
    pub enabled: bool,
    pub count: usize,
    /// Shell around the helix, in multiples of the helix radius.
    pub shell: RangeConfig,
    /// Chance per evolution tick of appending one more floating node.
    pub spawn_chance: f32,
    pub max_total_nodes: usize,
    pub weight: f32,
}

impl Default for FloatingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 6,
            shell: RangeConfig::new(1.4, 2.2),
            spawn_chance: 0.05,
            max_total_nodes: 24,
            weight: 0.2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RandomLinkConfig {
    pub enabled: bool,
    /// Extra links as a fraction of the node count.
    pub fraction: f32,
    pub weight: RangeConfig,
}

impl Default for RandomLinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fraction: 0.05,
            weight: RangeConfig::new(0.1, 0.4),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProximityConfig {
    pub enabled: bool,
    pub distance_threshold: f32,
    /// Index window scanned ahead of each node.
    pub window: usize,
    pub weight: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance_threshold: 4.0,
            window: 12,
            weight: 0.4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub enabled: bool,
    pub min_links_per_node: usize,
    pub max_attempts: usize,
    pub weight: f32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_links_per_node: 2,
            max_attempts: 4000,
            weight: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LinkBudgetConfig {
    /// Total link count to pad or truncate to. `None` keeps whatever the passes produced.
    pub target_link_count: Option<usize>,
    pub pad_attempts_per_link: usize,
    pub pad_weight: RangeConfig,
}

impl Default for LinkBudgetConfig {
    fn default() -> Self {
        Self {
            target_link_count: None,
            pad_attempts_per_link: 20,
            pad_weight: RangeConfig::new(0.1, 0.3),
        }
    }
}

/// Everything the topology generator reads. One value per generation pass.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StructuralConfig {
    pub helix: HelixConfig,
    pub layers: LayerConfig,
    pub grouping: GroupingConfig,
    pub cross_strand: CrossStrandConfig,
    pub spider_web: SpiderWebConfig,
    pub bridge: BridgeConfig,
    pub sub_strand: SubStrandConfig,
    pub end_noise: EndNoiseConfig,
    pub floating: FloatingConfig,
    pub random_links: RandomLinkConfig,
    pub proximity: ProximityConfig,
    pub connectivity: ConnectivityConfig,
    pub budget: LinkBudgetConfig,
}

impl StructuralConfig {
    /// Spine links only: every optional pass and auxiliary family disabled.
    pub fn spine_only() -> Self {
        let mut config = Self::default();
        config.grouping.enabled = false;
        config.cross_strand.enabled = false;
        config.spider_web.enabled = false;
        config.bridge.enabled = false;
        config.sub_strand.enabled = false;
        config.end_noise.enabled = false;
        config.floating.enabled = false;
        config.random_links.enabled = false;
        config.proximity.enabled = false;
        config.connectivity.enabled = false;
        config.budget.target_link_count = None;
        config
    }

    /// Clamps degenerate values to safe minimums instead of rejecting them.
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.helix.strand_count = clamp_min("helix.strand_count", c.helix.strand_count, 1);
        c.helix.radius = clamp_non_negative("helix.radius", c.helix.radius);
        c.helix.height = clamp_non_negative("helix.height", c.helix.height);
        c.helix.turns = clamp_non_negative("helix.turns", c.helix.turns);
        c.layers.io_fraction = clamp_unit("layers.io_fraction", c.layers.io_fraction);
        c.grouping.group_size = clamp_min("grouping.group_size", c.grouping.group_size, 1);
        c.grouping.intra_link_density =
            clamp_unit("grouping.intra_link_density", c.grouping.intra_link_density);
        c.spider_web.skip_chance = clamp_unit("spider_web.skip_chance", c.spider_web.skip_chance);
        c.spider_web.weight = c.spider_web.weight.sanitized("spider_web.weight", 0.0);
        c.bridge.chance = clamp_unit("bridge.chance", c.bridge.chance);
        c.bridge.max_total_nodes = c.bridge.max_total_nodes.min(MAX_NODES);
        c.sub_strand.chance = clamp_unit("sub_strand.chance", c.sub_strand.chance);
        c.sub_strand.min_length = clamp_min("sub_strand.min_length", c.sub_strand.min_length, 1);
        c.sub_strand.max_length = c.sub_strand.max_length.max(c.sub_strand.min_length);
        c.sub_strand.max_total_nodes = c.sub_strand.max_total_nodes.min(MAX_NODES);
        c.end_noise.chance = clamp_unit("end_noise.chance", c.end_noise.chance);
        c.end_noise.spawn_chance = clamp_unit("end_noise.spawn_chance", c.end_noise.spawn_chance);
        c.end_noise.jitter = clamp_non_negative("end_noise.jitter", c.end_noise.jitter);
        c.end_noise.max_total_nodes = c.end_noise.max_total_nodes.min(MAX_NODES);
        c.floating.shell = c.floating.shell.sanitized("floating.shell", 0.0);
        c.floating.spawn_chance = clamp_unit("floating.spawn_chance", c.floating.spawn_chance);
        c.floating.max_total_nodes = c.floating.max_total_nodes.min(MAX_NODES);
        c.random_links.fraction =
            clamp_non_negative("random_links.fraction", c.random_links.fraction);
        c.random_links.weight = c.random_links.weight.sanitized("random_links.weight", 0.0);
        c.proximity.distance_threshold =
            clamp_non_negative("proximity.distance_threshold", c.proximity.distance_threshold);
        c.budget.target_link_count = c.budget.target_link_count.map(|n| n.min(MAX_EDGES));
        c.budget.pad_weight = c.budget.pad_weight.sanitized("budget.pad_weight", 0.0);
        c
    }
}

/// Externally driven evolution targets, blended toward new values over time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionParams {
    pub target_node_count: usize,
    pub target_link_count: usize,
    pub growth_rate: f32,
    pub pruning_rate: f32,
    /// Probability of keeping the current links on an unforced tick.
    pub link_stability: f32,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            target_node_count: 60,
            target_link_count: 140,
            growth_rate: 0.3,
            pruning_rate: 0.1,
            link_stability: 0.85,
        }
    }
}

impl EvolutionParams {
    /// Moves every field a fraction `rate` of the way toward `target`.
    ///
    /// Counts always advance by at least one while they differ, so a small
    /// rate still converges.
    pub fn blend_toward(&mut self, target: &EvolutionParams, rate: f32) {
        let rate = rate.clamp(0.0, 1.0);
        self.target_node_count =
            blend_count(self.target_node_count, target.target_node_count, rate);
        self.target_link_count =
            blend_count(self.target_link_count, target.target_link_count, rate);
        self.growth_rate += (target.growth_rate - self.growth_rate) * rate;
        self.pruning_rate += (target.pruning_rate - self.pruning_rate) * rate;
        self.link_stability += (target.link_stability - self.link_stability) * rate;
    }

    pub fn sanitized(&self) -> Self {
        Self {
            target_node_count: self.target_node_count.min(MAX_NODES),
            target_link_count: self.target_link_count.min(MAX_EDGES),
            growth_rate: clamp_unit("params.growth_rate", self.growth_rate),
            pruning_rate: clamp_unit("params.pruning_rate", self.pruning_rate),
            link_stability: clamp_unit("params.link_stability", self.link_stability),
        }
    }
}

fn blend_count(current: usize, target: usize, rate: f32) -> usize {
    if current == target || rate <= 0.0 {
        return current;
    }
    let delta = (target as f32 - current as f32) * rate;
    let step = (delta.abs().round() as usize).max(1);
    if target > current {
        (current + step).min(target)
    } else {
        current.saturating_sub(step).max(target)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PulseConfig {
    pub enabled: bool,
    /// Maximum activation change per tick.
    pub jitter: f32,
    /// Floor on the chance that a node is active after resampling.
    pub min_active_chance: f32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jitter: 0.15,
            min_active_chance: 0.2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvolutionConfig {
    pub min_nodes: usize,
    pub max_nodes: usize,
    /// Ticks that must pass before an unforced rebuild may happen.
    pub min_rebuild_interval: u64,
    /// Fraction of the target link count that must survive for links to be kept.
    pub retention_threshold: f32,
    pub param_blend_rate: f32,
    pub pulse: PulseConfig,
    /// Re-derive node activation from the degree distribution after a rebuild.
    pub reactivate_from_degree: bool,
    pub reactivation_jitter: f32,
    pub initial: EvolutionParams,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            min_nodes: 4,
            max_nodes: 200,
            min_rebuild_interval: 10,
            retention_threshold: 0.6,
            param_blend_rate: 0.1,
            pulse: PulseConfig::default(),
            reactivate_from_degree: true,
            reactivation_jitter: 0.1,
            initial: EvolutionParams::default(),
        }
    }
}

impl EvolutionConfig {
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.max_nodes = c.max_nodes.clamp(1, MAX_NODES);
        c.min_nodes = c.min_nodes.min(c.max_nodes);
        c.retention_threshold = clamp_unit("evolution.retention_threshold", c.retention_threshold);
        c.param_blend_rate = clamp_unit("evolution.param_blend_rate", c.param_blend_rate);
        c.pulse.jitter = clamp_unit("evolution.pulse.jitter", c.pulse.jitter);
        c.pulse.min_active_chance =
            clamp_unit("evolution.pulse.min_active_chance", c.pulse.min_active_chance);
        c.reactivation_jitter = clamp_unit("evolution.reactivation_jitter", c.reactivation_jitter);
        c.initial = c.initial.sanitized();
        c
    }
}

/// A single oscillating organic effect. Which fields matter depends on the effect.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct WaveEffect {
    pub enabled: bool,
    pub amplitude: f32,
    pub speed: f32,
    /// Spatial frequency along the helix parameter.
    pub frequency: f32,
}

impl WaveEffect {
    pub const fn new(amplitude: f32, speed: f32, frequency: f32) -> Self {
        Self {
            enabled: true,
            amplitude,
            speed,
            frequency,
        }
    }

    /// Amplitude if enabled, zero otherwise.
    #[inline]
    pub fn gain(&self) -> f32 {
        if self.enabled {
            self.amplitude
        } else {
            0.0
        }
    }
}

impl Default for WaveEffect {
    fn default() -> Self {
        Self::new(0.0, 1.0, 1.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OrganicConfig {
    pub enabled: bool,
    /// Radians per second the whole helix turns.
    pub rotation_speed: f32,
    pub global_breathing: WaveEffect,
    pub node_breathing: WaveEffect,
    pub bulge: WaveEffect,
    pub squeeze: WaveEffect,
    pub twist: WaveEffect,
    pub vertical_wave: WaveEffect,
    pub drift: WaveEffect,
    pub orbit: WaveEffect,
    pub activation_expansion: WaveEffect,
    /// Drift applied to nodes with authoritative positions.
    pub forced_drift: WaveEffect,
}

impl Default for OrganicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rotation_speed: 0.05,
            global_breathing: WaveEffect::new(0.06, 0.4, 1.0),
            node_breathing: WaveEffect::new(0.05, 1.0, 1.0),
            bulge: WaveEffect::new(0.12, 0.3, 2.0),
            squeeze: WaveEffect::new(0.08, 0.5, 1.5),
            twist: WaveEffect::new(0.15, 0.2, 1.0),
            vertical_wave: WaveEffect::new(0.4, 0.6, 1.0),
            drift: WaveEffect::new(0.25, 1.0, 1.0),
            orbit: WaveEffect::new(0.05, 1.0, 1.0),
            activation_expansion: WaveEffect::new(0.15, 0.0, 0.0),
            forced_drift: WaveEffect::new(0.15, 0.7, 1.0),
        }
    }
}

/// How node colors are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Base color blended toward the active color by activation.
    #[default]
    Activity,
    /// Base color blended toward the flow color by a traveling phase.
    Flow,
    /// Hue oscillating around the base hue per node.
    Energy,
    /// Hue gradient by normalized index along the helix.
    Age,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ColorConfig {
    pub mode: ColorMode,
    pub base: [f32; 3],
    pub active: [f32; 3],
    pub flow: [f32; 3],
    pub flow_speed: f32,
    pub base_hue: f32,
    pub energy_speed: f32,
    pub energy_hue_range: f32,
    pub age_hue: RangeConfig,
    pub saturation: f32,
    pub lightness: f32,
    /// Brightness multiplier applied to inactive nodes.
    pub inactive_dim: f32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            mode: ColorMode::Activity,
            base: [0.15, 0.45, 0.85],
            active: [0.35, 0.95, 1.0],
            flow: [0.9, 0.5, 1.0],
            flow_speed: 0.25,
            base_hue: 0.55,
            energy_speed: 0.8,
            energy_hue_range: 0.12,
            age_hue: RangeConfig::new(0.55, 0.85),
            saturation: 0.7,
            lightness: 0.55,
            inactive_dim: 0.55,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SizeConfig {
    pub base: f32,
    pub breathing: f32,
    pub activity: f32,
    pub pulse: f32,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            base: 0.6,
            breathing: 0.15,
            activity: 0.5,
            pulse: 0.3,
        }
    }
}

/// Link curve shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStyle {
    Straight,
    #[default]
    Arc,
    Wave,
    Organic,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LinkStyleConfig {
    pub style: LinkStyle,
    /// Control point offset as a fraction of link length.
    pub curvature: f32,
    pub segments: usize,
    pub wave_speed: f32,
    pub flow_speed: f32,
    /// Width of the traveling pulse in curve-parameter units.
    pub flow_width: f32,
    pub flow_intensity: f32,
    /// Length of the fade at each end in curve-parameter units.
    pub end_fade: f32,
    pub end_fade_strength: f32,
    pub base_color: [f32; 3],
    pub flow_color: [f32; 3],
}

impl Default for LinkStyleConfig {
    fn default() -> Self {
        Self {
            style: LinkStyle::Arc,
            curvature: 0.25,
            segments: 12,
            wave_speed: 1.2,
            flow_speed: 0.35,
            flow_width: 0.08,
            flow_intensity: 0.8,
            end_fade: 0.15,
            end_fade_strength: 0.6,
            base_color: [0.2, 0.5, 0.8],
            flow_color: [0.7, 0.95, 1.0],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Fraction of the remaining distance left after one second.
    pub decay_base: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { decay_base: 0.002 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AnimationConfig {
    pub organic: OrganicConfig,
    pub color: ColorConfig,
    pub size: SizeConfig,
    pub links: LinkStyleConfig,
    pub smoothing: SmoothingConfig,
}

impl AnimationConfig {
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.links.segments = clamp_min("animation.links.segments", c.links.segments, 1);
        c.links.flow_width = c.links.flow_width.max(1e-3);
        c.links.end_fade = c.links.end_fade.clamp(0.0, 0.5);
        c.links.end_fade_strength =
            clamp_unit("animation.links.end_fade_strength", c.links.end_fade_strength);
        c.smoothing.decay_base = if c.smoothing.decay_base.is_finite() {
            c.smoothing.decay_base.clamp(1e-9, 1.0)
        } else {
            SmoothingConfig::default().decay_base
        };
        c.color.saturation = clamp_unit("animation.color.saturation", c.color.saturation);
        c.color.lightness = clamp_unit("animation.color.lightness", c.color.lightness);
        c.color.inactive_dim = clamp_unit("animation.color.inactive_dim", c.color.inactive_dim);
        c.size.base = clamp_non_negative("animation.size.base", c.size.base);
        c
    }
}

/// Timer cadence and run length for the headless runner.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RuntimeConfig {
    pub initial_nodes: usize,
    pub evolution_interval_ms: u64,
    pub target_fps: u64,
    pub duration_secs: u64,
    pub seed: Option<u64>,
    /// Log a metrics summary every this many evolution ticks.
    pub summary_interval: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_nodes: 40,
            evolution_interval_ms: 500,
            target_fps: 60,
            duration_secs: 30,
            seed: None,
            summary_interval: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub structure: StructuralConfig,
    pub evolution: EvolutionConfig,
    pub animation: AnimationConfig,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    /// Validates configuration at load time.
    ///
    /// The core never calls this; it clamps through [`AppConfig::sanitized`].
    /// Collaborators use it to surface bad files before running.
    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.structure;
        anyhow::ensure!(s.helix.strand_count > 0, "Strand count must be positive");
        anyhow::ensure!(s.helix.radius >= 0.0, "Helix radius must be non-negative");
        anyhow::ensure!(s.helix.height >= 0.0, "Helix height must be non-negative");
        anyhow::ensure!(
            (0.0..=0.5).contains(&s.layers.io_fraction),
            "IO fraction must be in [0.0, 0.5]"
        );
        anyhow::ensure!(s.grouping.group_size > 0, "Group size must be positive");
        for (name, p) in [
            ("Intra link density", s.grouping.intra_link_density),
            ("Spider web skip chance", s.spider_web.skip_chance),
            ("Bridge chance", s.bridge.chance),
            ("Sub-strand chance", s.sub_strand.chance),
            ("End-noise chance", s.end_noise.chance),
            ("End-noise spawn chance", s.end_noise.spawn_chance),
            ("Floating spawn chance", s.floating.spawn_chance),
        ] {
            anyhow::ensure!((0.0..=1.0).contains(&p), "{} must be in [0.0, 1.0]", name);
        }
        anyhow::ensure!(
            s.sub_strand.min_length <= s.sub_strand.max_length,
            "Sub-strand min length must not exceed max length"
        );
        for (name, r) in [
            ("Spider web weight", s.spider_web.weight),
            ("Random link weight", s.random_links.weight),
            ("Floating shell", s.floating.shell),
            ("Pad weight", s.budget.pad_weight),
        ] {
            anyhow::ensure!(r.min <= r.max, "{} range is inverted", name);
        }
        if let Some(target) = s.budget.target_link_count {
            anyhow::ensure!(target <= MAX_EDGES, "Target link count too large (max {})", MAX_EDGES);
        }

        let e = &self.evolution;
        anyhow::ensure!(e.max_nodes > 0, "Max nodes must be positive");
        anyhow::ensure!(e.max_nodes <= MAX_NODES, "Max nodes too large (max {})", MAX_NODES);
        anyhow::ensure!(e.min_nodes <= e.max_nodes, "Min nodes must not exceed max nodes");
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.retention_threshold),
            "Retention threshold must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.initial.link_stability),
            "Link stability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.initial.growth_rate),
            "Growth rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.initial.pruning_rate),
            "Pruning rate must be in [0.0, 1.0]"
        );

        let a = &self.animation;
        anyhow::ensure!(a.links.segments > 0, "Link segments must be positive");
        anyhow::ensure!(
            a.smoothing.decay_base > 0.0 && a.smoothing.decay_base <= 1.0,
            "Smoothing decay base must be in (0.0, 1.0]"
        );

        anyhow::ensure!(self.runtime.target_fps > 0, "Target FPS must be positive");
        anyhow::ensure!(self.runtime.target_fps <= 240, "Target FPS too high (max 240)");
        anyhow::ensure!(
            self.runtime.evolution_interval_ms > 0,
            "Evolution interval must be positive"
        );
        anyhow::ensure!(
            self.runtime.initial_nodes <= MAX_NODES,
            "Initial node count too large (max {})",
            MAX_NODES
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Clamps every section to values the core can run with.
    pub fn sanitized(&self) -> Self {
        Self {
            structure: self.structure.sanitized(),
            evolution: self.evolution.sanitized(),
            animation: self.animation.sanitized(),
            runtime: self.runtime.clone(),
        }
    }

    /// Stable digest of the structural, evolution and animation sections.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.structure).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(format!("{:?}", self.animation).as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn clamp_unit(name: &str, value: f32) -> f32 {
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if clamped != value {
        tracing::warn!(field = name, value, clamped, "Probability clamped");
    }
    clamped
}

fn clamp_non_negative(name: &str, value: f32) -> f32 {
    let clamped = if value.is_finite() { value.max(0.0) } else { 0.0 };
    if clamped != value {
        tracing::warn!(field = name, value, clamped, "Value clamped");
    }
    clamped
}

fn clamp_min(name: &str, value: usize, min: usize) -> usize {
    if value < min {
        tracing::warn!(field = name, value, clamped = min, "Count clamped");
        min
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_strand_count_rejected() {
        let mut config = AppConfig::default();
        config.structure.helix.strand_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_strand_count_sanitized() {
        let mut config = AppConfig::default();
        config.structure.helix.strand_count = 0;
        config.structure.bridge.chance = 3.0;
        config.structure.spider_web.weight = RangeConfig::new(0.5, 0.1);
        let clean = config.sanitized();
        assert_eq!(clean.structure.helix.strand_count, 1);
        assert_eq!(clean.structure.bridge.chance, 1.0);
        assert!(clean.structure.spider_web.weight.max >= clean.structure.spider_web.weight.min);
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn test_invalid_retention_threshold() {
        let config = AppConfig {
            evolution: EvolutionConfig {
                retention_threshold: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [structure.helix]
            strand_count = 3

            [animation.color]
            mode = "energy"
            "#,
        )
        .unwrap();
        assert_eq!(config.structure.helix.strand_count, 3);
        assert_eq!(config.structure.helix.radius, HelixConfig::default().radius);
        assert_eq!(config.animation.color.mode, ColorMode::Energy);
        assert_eq!(config.evolution.min_rebuild_interval, 10);
    }

    #[test]
    fn test_blend_toward_converges() {
        let mut params = EvolutionParams::default();
        let target = EvolutionParams {
            target_node_count: 100,
            target_link_count: 141,
            growth_rate: 0.9,
            pruning_rate: 0.0,
            link_stability: 0.2,
        };
        for _ in 0..200 {
            params.blend_toward(&target, 0.05);
        }
        assert_eq!(params.target_node_count, 100);
        assert_eq!(params.target_link_count, 141);
        assert!((params.growth_rate - 0.9).abs() < 1e-3);
        assert!((params.link_stability - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_blend_toward_zero_rate_is_noop() {
        let mut params = EvolutionParams::default();
        let before = params.clone();
        params.blend_toward(&EvolutionParams { target_node_count: 5, ..before.clone() }, 0.0);
        assert_eq!(params, before);
    }

    #[test]
    fn test_fingerprint_consistency() {
        let a = AppConfig::default();
        let b = AppConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        let mut c = AppConfig::default();
        c.structure.helix.turns = 4.0;
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
