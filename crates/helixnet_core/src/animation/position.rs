//! Live node placement.
//!
//! [`helix_target_position`] is the authoritative position of a base node.
//! It starts from the same [`HelixCoordinate`] the generator uses and adds
//! rotation plus every enabled organic effect. Each effect is additive and
//! can be switched off on its own.

use crate::config::{HelixConfig, OrganicConfig};
use crate::entity_state::NodeEntityState;
use crate::topology::HelixCoordinate;
use helixnet_data::Vec3;
use std::f32::consts::TAU;

fn wave(phase: f32) -> f32 {
    phase.sin()
}

/// Rotates `p` about the vertical axis.
pub fn rotate_y(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c - p.z * s, p.y, p.x * s + p.z * c)
}

/// Per-node drift offset, one independent oscillator per axis.
pub fn drift_offset(state: &NodeEntityState, amplitude: f32, speed: f32, time: f32) -> Vec3 {
    if amplitude == 0.0 {
        return Vec3::ZERO;
    }
    let rate = speed * state.drift_rate;
    Vec3::new(
        amplitude * wave(time * rate + state.drift_phase[0]),
        amplitude * wave(time * rate * 0.8 + state.drift_phase[1]),
        amplitude * wave(time * rate * 1.2 + state.drift_phase[2]),
    )
}

/// Target position of a base node at `time` seconds.
pub fn helix_target_position(
    coord: HelixCoordinate,
    state: &NodeEntityState,
    activation: f32,
    time: f32,
    helix: &HelixConfig,
    organic: &OrganicConfig,
) -> Vec3 {
    let mut angle = coord.angle + time * organic.rotation_speed;
    let mut radius = helix.radius;
    let mut y = (coord.t - 0.5) * helix.height;

    if !organic.enabled {
        return Vec3::new(radius * angle.cos(), y, radius * angle.sin());
    }

    let along = coord.t * TAU;

    let g = &organic.global_breathing;
    radius *= 1.0 + g.gain() * wave(time * g.speed * TAU);

    let b = &organic.node_breathing;
    radius *= 1.0 + b.gain() * wave(time * b.speed * state.breathing_rate + state.breathing_phase);

    let m = &organic.bulge;
    let morph = along * m.frequency + time * m.speed * state.morph_speed + state.morph_phase;
    radius *= 1.0 + m.gain() * wave(morph);

    let s = &organic.squeeze;
    radius *= 1.0 - s.gain() * (0.5 + 0.5 * wave(along * s.frequency - time * s.speed * TAU));

    let e = &organic.activation_expansion;
    radius *= 1.0 + e.gain() * activation.clamp(0.0, 1.0);

    let tw = &organic.twist;
    angle += tw.gain() * wave(along * tw.frequency + time * tw.speed * TAU);

    let v = &organic.vertical_wave;
    y += v.gain() * wave(along * v.frequency + time * v.speed * TAU);

    let radius = radius.max(0.0);
    let mut p = Vec3::new(radius * angle.cos(), y, radius * angle.sin());

    let o = &organic.orbit;
    if o.gain() > 0.0 {
        let phase = state.orbit_phase + time * o.speed * state.orbit_speed;
        p += Vec3::new(phase.cos(), 0.0, phase.sin()) * (o.gain() * helix.radius);
    }

    let d = &organic.drift;
    p + drift_offset(state, d.gain(), d.speed, time)
}

/// Target position of a node with authoritative coordinates: the anchor
/// turned with the helix, plus a small drift.
pub fn forced_target_position(
    anchor: Vec3,
    state: &NodeEntityState,
    time: f32,
    organic: &OrganicConfig,
) -> Vec3 {
    let rotated = rotate_y(anchor, time * organic.rotation_speed);
    if !organic.enabled {
        return rotated;
    }
    let d = &organic.forced_drift;
    rotated + drift_offset(state, d.gain(), d.speed, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{estimate_helix_position, helix_coordinate};

    fn still() -> OrganicConfig {
        OrganicConfig {
            rotation_speed: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_organic_matches_estimate() {
        let helix = HelixConfig::default();
        let organic = OrganicConfig {
            enabled: false,
            rotation_speed: 0.0,
            ..Default::default()
        };
        let state = NodeEntityState::derive("n3");
        for i in 0..20 {
            let coord = helix_coordinate(i, 20, &helix);
            let live = helix_target_position(coord, &state, 0.7, 12.5, &helix, &organic);
            let est = estimate_helix_position(i, 20, &helix);
            assert!(live.distance(est) < 1e-4);
        }
    }

    #[test]
    fn test_effects_stay_near_estimate() {
        let helix = HelixConfig::default();
        let state = NodeEntityState::derive("n5");
        let coord = helix_coordinate(5, 30, &helix);
        let est = estimate_helix_position(5, 30, &helix);
        for step in 0..100 {
            let p = helix_target_position(coord, &state, 1.0, step as f32 * 0.37, &helix, &still());
            assert!(p.distance(est) < helix.radius, "drifted to {:?}", p);
        }
    }

    #[test]
    fn test_each_effect_can_be_disabled() {
        let helix = HelixConfig::default();
        let state = NodeEntityState::derive("n1");
        let coord = helix_coordinate(1, 10, &helix);
        let mut organic = still();
        for effect in [
            &mut organic.global_breathing,
            &mut organic.node_breathing,
            &mut organic.bulge,
            &mut organic.squeeze,
            &mut organic.twist,
            &mut organic.vertical_wave,
            &mut organic.drift,
            &mut organic.orbit,
            &mut organic.activation_expansion,
        ] {
            effect.enabled = false;
        }
        let p = helix_target_position(coord, &state, 1.0, 3.0, &helix, &organic);
        assert!(p.distance(estimate_helix_position(1, 10, &helix)) < 1e-4);
    }

    #[test]
    fn test_forced_position_only_drifts() {
        let state = NodeEntityState::derive("bridge-n0-n1");
        let anchor = Vec3::new(2.0, -3.0, 1.0);
        let organic = still();
        for step in 0..50 {
            let p = forced_target_position(anchor, &state, step as f32 * 0.5, &organic);
            assert!(p.distance(anchor) <= organic.forced_drift.amplitude * 3f32.sqrt() + 1e-4);
        }
    }

    #[test]
    fn test_rotation_preserves_radius() {
        let p = Vec3::new(3.0, 1.0, 4.0);
        let r = rotate_y(p, 1.234);
        assert!((r.x.hypot(r.z) - 5.0).abs() < 1e-4);
        assert_eq!(r.y, 1.0);
    }
}
