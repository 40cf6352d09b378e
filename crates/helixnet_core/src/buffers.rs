//! Flat render buffers filled from a [`FrameSample`].
//!
//! Capacity is reserved once for [`MAX_NODES`] nodes and [`MAX_EDGES`]
//! links, so steady-state frames copy into existing storage without
//! reallocating. Draw counts tell the renderer how much of each buffer is
//! live.

use crate::animation::FrameSample;
use crate::config::{MAX_EDGES, MAX_NODES};

/// Anything that can take a sampled frame.
pub trait BufferSync {
    fn sync(&mut self, frame: &FrameSample);
}

#[derive(Debug, Clone)]
pub struct RenderBuffers {
    /// xyz per node.
    pub positions: Vec<f32>,
    /// rgb per node.
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
    /// xyz per link point, `points_per_link` points per link.
    pub link_positions: Vec<f32>,
    /// rgb per link point.
    pub link_colors: Vec<f32>,
    pub node_draw_count: usize,
    pub link_draw_count: usize,
    pub points_per_link: usize,
    /// Set by every sync, cleared by the consumer once uploaded.
    pub dirty: bool,
}

impl RenderBuffers {
    pub fn new(points_per_link: usize) -> Self {
        let points_per_link = points_per_link.max(2);
        let link_points = MAX_EDGES * points_per_link;
        Self {
            positions: Vec::with_capacity(MAX_NODES * 3),
            colors: Vec::with_capacity(MAX_NODES * 3),
            sizes: Vec::with_capacity(MAX_NODES),
            link_positions: Vec::with_capacity(link_points * 3),
            link_colors: Vec::with_capacity(link_points * 3),
            node_draw_count: 0,
            link_draw_count: 0,
            points_per_link,
            dirty: false,
        }
    }

    /// Link vertices to draw, `link_draw_count * points_per_link`.
    pub fn link_vertex_count(&self) -> usize {
        self.link_draw_count * self.points_per_link
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

fn flatten_into(dst: &mut Vec<f32>, src: &[[f32; 3]]) {
    dst.clear();
    dst.extend(src.iter().flatten().copied());
}

impl BufferSync for RenderBuffers {
    fn sync(&mut self, frame: &FrameSample) {
        let nodes = frame.node_count().min(MAX_NODES);
        let links = frame.link_count.min(MAX_EDGES);
        let points = (links * frame.points_per_link).min(frame.link_points.len());

        flatten_into(&mut self.positions, &frame.node_positions[..nodes]);
        flatten_into(&mut self.colors, &frame.node_colors[..nodes]);
        self.sizes.clear();
        self.sizes.extend_from_slice(&frame.node_sizes[..nodes]);
        flatten_into(&mut self.link_positions, &frame.link_points[..points]);
        flatten_into(&mut self.link_colors, &frame.link_colors[..points]);

        self.node_draw_count = nodes;
        self.link_draw_count = links;
        self.points_per_link = frame.points_per_link;
        self.dirty = true;
    }
}
