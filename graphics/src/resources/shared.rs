//! Geometry shared by every sprite and billboard.

use std::sync::Arc;

use crate::resources::Buffer;
use crate::types::{BufferDescriptor, BufferUsage};

/// Corner positions of the unit quad, `[x, y]` in `[-0.5, 0.5]`.
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

/// Two counter-clockwise triangles covering the unit quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Number of indices drawn per quad.
pub const QUAD_INDEX_COUNT: u32 = QUAD_INDICES.len() as u32;

/// Renderer-owned buffers referenced by sprite and billboard draws.
///
/// Sprite batches only carry per-instance data; the quad they expand is
/// shared.
#[derive(Debug, Clone)]
pub struct RendererResources {
    quad_vertices: Arc<Buffer>,
    quad_indices: Arc<Buffer>,
}

impl RendererResources {
    pub fn new() -> Self {
        let quad_vertices = Buffer::new(
            BufferDescriptor::new(std::mem::size_of_val(&QUAD_VERTICES) as u64, BufferUsage::VERTEX)
                .with_label("shared_quad_vertices"),
        );
        let quad_indices = Buffer::new(
            BufferDescriptor::new(std::mem::size_of_val(&QUAD_INDICES) as u64, BufferUsage::INDEX)
                .with_label("shared_quad_indices"),
        );
        Self {
            quad_vertices,
            quad_indices,
        }
    }

    pub fn quad_vertex_buffer(&self) -> &Arc<Buffer> {
        &self.quad_vertices
    }

    pub fn quad_index_buffer(&self) -> &Arc<Buffer> {
        &self.quad_indices
    }
}

impl Default for RendererResources {
    fn default() -> Self {
        Self::new()
    }
}
