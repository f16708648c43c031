//! World instances.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use lilium_core::math::Mat4;
use parking_lot::RwLock;

use crate::types::InstanceId;

/// Per-draw data uploaded for every element of an instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceUniforms {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// Linear RGBA tint multiplied into the material color.
    pub tint: [f32; 4],
}

/// A placed object in the world.
///
/// Transform updates are not observed automatically. After moving an
/// instance, call
/// [`FramePipeline::invalidate_world_instance`](crate::pipeline::FramePipeline::invalidate_world_instance)
/// so visibility is recomputed.
pub struct WorldInstance {
    id: InstanceId,
    transform: RwLock<Mat4>,
    tint: RwLock<[f32; 4]>,
}

impl WorldInstance {
    pub fn new(transform: Mat4) -> Arc<Self> {
        Arc::new(Self {
            id: InstanceId::next(),
            transform: RwLock::new(transform),
            tint: RwLock::new([1.0; 4]),
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn transform(&self) -> Mat4 {
        *self.transform.read()
    }

    pub fn set_transform(&self, transform: Mat4) {
        *self.transform.write() = transform;
    }

    pub fn tint(&self) -> [f32; 4] {
        *self.tint.read()
    }

    pub fn set_tint(&self, tint: [f32; 4]) {
        *self.tint.write() = tint;
    }

    /// Snapshot of the data uploaded for each draw of this instance.
    pub fn uniforms(&self) -> InstanceUniforms {
        let m = self.transform();
        let mut model = [[0.0; 4]; 4];
        for (c, column) in model.iter_mut().enumerate() {
            for (r, value) in column.iter_mut().enumerate() {
                *value = m[(r, c)];
            }
        }
        InstanceUniforms {
            model,
            tint: self.tint(),
        }
    }
}

impl std::fmt::Debug for WorldInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldInstance")
            .field("id", &self.id)
            .field("transform", &*self.transform.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(WorldInstance: Send, Sync);
static_assertions::const_assert_eq!(std::mem::size_of::<InstanceUniforms>(), 80);

#[cfg(test)]
mod tests {
    use super::*;
    use lilium_core::math::{Vec3, mat4_from_translation};

    #[test]
    fn uniforms_are_column_major() {
        let instance = WorldInstance::new(mat4_from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let uniforms = instance.uniforms();
        assert_eq!(uniforms.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniforms.model[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniforms.tint, [1.0; 4]);
    }

    #[test]
    fn transform_and_tint_are_mutable_through_shared_ref() {
        let instance = WorldInstance::new(Mat4::identity());
        instance.set_transform(mat4_from_translation(Vec3::new(0.0, 5.0, 0.0)));
        instance.set_tint([0.5, 0.5, 0.5, 1.0]);
        assert_eq!(instance.transform()[(1, 3)], 5.0);
        assert_eq!(instance.uniforms().tint, [0.5, 0.5, 0.5, 1.0]);
    }
}
