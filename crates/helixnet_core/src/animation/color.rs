//! Node colors and sizes. Colors are linear RGB in `[0, 1]`.

use crate::config::{ColorConfig, ColorMode, SizeConfig};
use crate::entity_state::NodeEntityState;
use std::f32::consts::TAU;

pub type Rgb = [f32; 3];

pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

pub fn scale_rgb(c: Rgb, k: f32) -> Rgb {
    [
        (c[0] * k).clamp(0.0, 1.0),
        (c[1] * k).clamp(0.0, 1.0),
        (c[2] * k).clamp(0.0, 1.0),
    ]
}

/// HSL to RGB. Hue wraps, saturation and lightness are clamped.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    if s == 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// What a node's color depends on besides its own state.
#[derive(Debug, Clone, Copy)]
pub struct ColorInput {
    pub activation: f32,
    pub active: bool,
    /// Normalized position of the node in the live ordering, `[0, 1]`.
    pub order: f32,
    pub time: f32,
}

pub fn node_color(config: &ColorConfig, state: &NodeEntityState, input: ColorInput) -> Rgb {
    let color = match config.mode {
        ColorMode::Activity => lerp_rgb(config.base, config.active, input.activation),
        ColorMode::Flow => {
            let phase = (input.order - input.time * config.flow_speed) * TAU;
            lerp_rgb(config.base, config.flow, 0.5 + 0.5 * phase.sin())
        }
        ColorMode::Energy => {
            let swing =
                (input.time * config.energy_speed * state.breathing_rate + state.pulse_phase).sin();
            hsl_to_rgb(
                config.base_hue + config.energy_hue_range * swing,
                config.saturation,
                config.lightness + 0.15 * input.activation,
            )
        }
        ColorMode::Age => hsl_to_rgb(
            config.age_hue.lerp(input.order.clamp(0.0, 1.0)),
            config.saturation,
            config.lightness,
        ),
    };
    if input.active {
        color
    } else {
        scale_rgb(color, config.inactive_dim)
    }
}

/// Size from breathing, activation and a sharp pulse on active nodes.
pub fn node_size(
    config: &SizeConfig,
    state: &NodeEntityState,
    activation: f32,
    active: bool,
    time: f32,
) -> f32 {
    let breathing =
        1.0 + config.breathing * (time * state.breathing_rate + state.breathing_phase).sin();
    let activity = 1.0 + config.activity * activation.clamp(0.0, 1.0);
    let pulse = if active {
        config.pulse * (time * state.pulse_rate + state.pulse_phase).sin().max(0.0).powi(8)
    } else {
        0.0
    };
    (config.base * breathing * activity + pulse).max(0.0)
}
