//! Link curves: a quadratic bezier between two smoothed endpoints, colored
//! by a traveling flow pulse and faded at both ends.

use super::color::{lerp_rgb, scale_rgb, Rgb};
use crate::config::{LinkStyle, LinkStyleConfig};
use crate::entity_state::LinkEntityState;
use helixnet_data::Vec3;

/// Unit vector perpendicular to `dir`, preferring the horizontal plane.
fn perpendicular(dir: Vec3) -> Option<Vec3> {
    dir.cross(Vec3::Y)
        .try_normalize()
        .or_else(|| dir.cross(Vec3::X).try_normalize())
}

/// Bezier control point for a link from `a` to `b` at `time`.
pub fn control_point(
    a: Vec3,
    b: Vec3,
    config: &LinkStyleConfig,
    state: &LinkEntityState,
    time: f32,
) -> Vec3 {
    let mid = a.lerp(b, 0.5);
    let dir = b - a;
    let length = dir.length();
    let offset = match config.style {
        LinkStyle::Straight => return mid,
        LinkStyle::Arc => state.curvature_sign,
        LinkStyle::Wave => (time * config.wave_speed + state.wave_phase).sin(),
        LinkStyle::Organic => {
            state.curvature_sign
                * state.curvature_jitter
                * (0.75 + 0.25 * (time * config.wave_speed * 0.5 + state.wave_phase).sin())
        }
    };
    match perpendicular(dir) {
        Some(normal) => mid + normal * (offset * config.curvature * length),
        None => mid,
    }
}

pub fn quadratic_point(a: Vec3, control: Vec3, b: Vec3, u: f32) -> Vec3 {
    let v = 1.0 - u;
    a * (v * v) + control * (2.0 * v * u) + b * (u * u)
}

/// Center of the flow pulse along the curve, in `[0, 1)`.
pub fn flow_head(config: &LinkStyleConfig, state: &LinkEntityState, time: f32) -> f32 {
    (state.flow_phase + time * config.flow_speed * state.flow_speed_jitter).rem_euclid(1.0)
}

/// Gaussian pulse intensity at curve parameter `u`. Distance wraps so the
/// pulse re-enters smoothly.
pub fn flow_intensity(u: f32, head: f32, width: f32) -> f32 {
    let d = (u - head).abs();
    let d = d.min(1.0 - d);
    (-(d * d) / (2.0 * width * width)).exp()
}

/// Brightness multiplier near the endpoints.
pub fn end_fade(u: f32, fade: f32, strength: f32) -> f32 {
    if fade <= 0.0 {
        return 1.0;
    }
    let edge = u.min(1.0 - u);
    if edge >= fade {
        1.0
    } else {
        1.0 - strength * (1.0 - edge / fade)
    }
}

/// Appends `segments + 1` points and colors for one link.
#[allow(clippy::too_many_arguments)]
pub fn sample_link(
    a: Vec3,
    b: Vec3,
    config: &LinkStyleConfig,
    state: &LinkEntityState,
    brightness: f32,
    time: f32,
    points: &mut Vec<[f32; 3]>,
    colors: &mut Vec<Rgb>,
) {
    let control = control_point(a, b, config, state, time);
    let head = flow_head(config, state, time);
    let segments = config.segments.max(1);
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        points.push(quadratic_point(a, control, b, u).to_array());
        let flow = flow_intensity(u, head, config.flow_width) * config.flow_intensity;
        let color = lerp_rgb(config.base_color, config.flow_color, flow);
        let fade = end_fade(u, config.end_fade, config.end_fade_strength);
        colors.push(scale_rgb(color, brightness * fade));
    }
}
