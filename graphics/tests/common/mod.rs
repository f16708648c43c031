//! Common fixtures for frame pipeline integration tests.
//!
//! Every test runs against [`DummyBackend`] and records into a
//! [`RecordingEncoder`], so no GPU is needed.

#![allow(dead_code)]

use std::sync::Arc;

use lilium_core::math::{Aabb, Mat4, Vec3};
use lilium_graphics::queue::RenderQueue;
use lilium_graphics::scene::Submesh;
use lilium_graphics::{
    AbstractViewer, BlendMode, Buffer, BufferDescriptor, BufferUsage, Camera, DummyBackend,
    FrameContext, FramePipeline, FramePipelineConfig, FrameReport, InstancedRenderable, Material,
    MaterialDescriptor, PipelineError, RecordingEncoder, RenderElement, RenderTarget,
    RenderableKind, ShaderLibrary, TextureFormat, WorldInstance,
};

pub const SURFACE_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Pipeline
// ============================================================================

/// A pipeline plus the backend it renders through.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub pipeline: FramePipeline,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(FramePipelineConfig::default())
    }

    pub fn with_config(config: FramePipelineConfig) -> Self {
        Self::with_backend(DummyBackend::new(), config)
    }

    pub fn with_backend(backend: DummyBackend, config: FramePipelineConfig) -> Self {
        Self::with_parts(backend, ShaderLibrary::standard(), config)
    }

    /// A pipeline resolving shaders through `library`.
    pub fn with_library(library: ShaderLibrary) -> Self {
        Self::with_parts(DummyBackend::new(), library, FramePipelineConfig::default())
    }

    pub fn with_parts(
        backend: DummyBackend,
        library: ShaderLibrary,
        config: FramePipelineConfig,
    ) -> Self {
        init_logging();
        let backend = Arc::new(backend);
        let pipeline = FramePipeline::new(backend.clone(), library, config)
            .expect("default formats are supported by the dummy backend");
        Self { backend, pipeline }
    }

    /// Render one frame, returning the report and everything recorded.
    pub fn render(&mut self) -> (FrameReport, RecordingEncoder) {
        let (result, encoder) = self.try_render();
        (result.expect("frame should render"), encoder)
    }

    pub fn try_render(&mut self) -> (Result<FrameReport, PipelineError>, RecordingEncoder) {
        let mut encoder = RecordingEncoder::new();
        let result = self.pipeline.render(&mut FrameContext::new(&mut encoder));
        (result, encoder)
    }

    /// Register `viewer`, panicking on failure.
    pub fn add_viewer(&mut self, viewer: &Arc<dyn AbstractViewer>) {
        self.pipeline
            .register_viewer(viewer)
            .expect("viewer should register");
    }

    /// The forward queue of a registered viewer.
    pub fn forward_queue(&self, viewer: &Arc<dyn AbstractViewer>) -> &RenderQueue<RenderElement> {
        self.pipeline
            .viewer_data(viewer)
            .expect("viewer is registered")
            .forward_queue()
    }

    pub fn depth_queue(&self, viewer: &Arc<dyn AbstractViewer>) -> &RenderQueue<RenderElement> {
        self.pipeline
            .viewer_data(viewer)
            .expect("viewer is registered")
            .depth_queue()
    }
}

// ============================================================================
// Viewers
// ============================================================================

pub fn surface(width: u32, height: u32) -> RenderTarget {
    RenderTarget::surface(SURFACE_FORMAT, width, height)
}

/// A camera at +Z looking at the origin.
pub fn camera(label: &str, target: RenderTarget) -> Arc<dyn AbstractViewer> {
    Arc::new(camera_at(label, target, Vec3::new(0.0, 0.0, 10.0)))
}

pub fn camera_at(label: &str, target: RenderTarget, eye: Vec3) -> Camera {
    Camera::new(label, target).with_look_at(eye, Vec3::zeros(), Vec3::y())
}

// ============================================================================
// Scene objects
// ============================================================================

pub fn vertex_buffer() -> Arc<Buffer> {
    Buffer::new(BufferDescriptor::new(4096, BufferUsage::VERTEX).with_label("vertices"))
}

pub fn opaque_material() -> Arc<Material> {
    Material::new(MaterialDescriptor::new().with_label("opaque"))
}

pub fn transparent_material() -> Arc<Material> {
    Material::new(
        MaterialDescriptor::new()
            .with_label("glass")
            .with_blend_mode(BlendMode::Transparent),
    )
}

pub fn material_with_shader(shader: &str) -> Arc<Material> {
    Material::new(MaterialDescriptor::new().with_shader(shader))
}

/// A unit cube drawn as one submesh with `material`.
pub fn cube(buffer: &Arc<Buffer>, material: Arc<Material>) -> Arc<InstancedRenderable> {
    InstancedRenderable::new(
        "cube",
        RenderableKind::Model {
            submeshes: vec![Submesh {
                vertices: buffer.whole(),
                indices: None,
                count: 36,
                material_index: 0,
            }],
        },
        vec![material],
        Aabb::from_center_half_extents(Vec3::zeros(), Vec3::repeat(0.5)),
    )
}

pub fn instance_at(x: f32, y: f32, z: f32) -> Arc<WorldInstance> {
    WorldInstance::new(Mat4::new_translation(&Vec3::new(x, y, z)))
}

// ============================================================================
// Queue inspection
// ============================================================================

/// Number of queued elements drawing `renderable`.
pub fn count_renderable(queue: &RenderQueue<RenderElement>, renderable: &InstancedRenderable) -> usize {
    queue
        .iter()
        .filter(|e| e.renderable == renderable.id())
        .count()
}

/// Number of queued elements placed at `instance`.
pub fn count_instance(queue: &RenderQueue<RenderElement>, instance: &WorldInstance) -> usize {
    queue
        .iter()
        .filter(|e| e.instance_id == instance.id())
        .count()
}
