//! Helix parameterization shared by generation and animation.
//!
//! [`helix_coordinate`] is the single source of truth for which strand,
//! rung, parameter `t` and base angle an index maps to. Two position
//! functions build on it:
//!
//! - [`estimate_helix_position`]: static, approximate. Used at generation
//!   time to place auxiliary nodes and to find proximity partners.
//! - `animation::position::helix_target_position`: authoritative, live.
//!   Adds rotation and organic effects on top of the same coordinate.
//!
//! They may disagree on amplitude, never on strand, rung or angle.

use crate::config::HelixConfig;
use helixnet_data::Vec3;
use std::f32::consts::TAU;

/// Where a base node sits on the helix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelixCoordinate {
    /// Normalized position along the helix axis, `0` at the bottom rung.
    pub t: f32,
    pub strand: usize,
    pub rung: usize,
    /// Angle around the axis before any time-dependent rotation.
    pub angle: f32,
}

/// Number of rungs needed for `total` base nodes.
pub fn rung_count(total: usize, strand_count: usize) -> usize {
    total.div_ceil(strand_count.max(1)).max(1)
}

/// Maps a base index to its strand, rung and helix parameter.
///
/// Strands are assigned round-robin, so index `i` lands on strand
/// `i % strands` at rung `i / strands`.
pub fn helix_coordinate(index: usize, total: usize, helix: &HelixConfig) -> HelixCoordinate {
    let strands = helix.strand_count.max(1);
    let rungs = rung_count(total, strands);
    let rung = index / strands;
    let strand = index % strands;
    let t = if rungs > 1 {
        rung as f32 / (rungs - 1) as f32
    } else {
        0.5
    };
    let angle = t * helix.turns * TAU + strand as f32 * TAU / strands as f32;
    HelixCoordinate {
        t,
        strand,
        rung,
        angle,
    }
}

/// Approximate static position of a base node. Generation-time only.
pub fn estimate_helix_position(index: usize, total: usize, helix: &HelixConfig) -> Vec3 {
    let c = helix_coordinate(index, total, helix);
    Vec3::new(
        helix.radius * c.angle.cos(),
        (c.t - 0.5) * helix.height,
        helix.radius * c.angle.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_assignment() {
        let helix = HelixConfig {
            strand_count: 3,
            ..Default::default()
        };
        let c = helix_coordinate(7, 12, &helix);
        assert_eq!(c.strand, 1);
        assert_eq!(c.rung, 2);
    }

    #[test]
    fn test_same_rung_strands_are_opposite_for_double_helix() {
        let helix = HelixConfig::default();
        let a = estimate_helix_position(4, 10, &helix);
        let b = estimate_helix_position(5, 10, &helix);
        assert!((a.y - b.y).abs() < 1e-5);
        assert!((a.x + b.x).abs() < 1e-3);
        assert!((a.z + b.z).abs() < 1e-3);
    }

    #[test]
    fn test_single_rung_sits_at_center() {
        let helix = HelixConfig::default();
        let c = helix_coordinate(0, 1, &helix);
        assert_eq!(c.t, 0.5);
        assert_eq!(estimate_helix_position(0, 1, &helix).y, 0.0);
    }

    #[test]
    fn test_zero_strands_treated_as_one() {
        let helix = HelixConfig {
            strand_count: 0,
            ..Default::default()
        };
        let c = helix_coordinate(3, 4, &helix);
        assert_eq!(c.strand, 0);
        assert_eq!(c.rung, 3);
        assert_eq!(c.t, 1.0);
    }
}
