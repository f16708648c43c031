//! Material definition.
//!
//! Materials are shared across renderables as `Arc<Material>`. The pipeline
//! never owns them: it subscribes to [`Material::events`] and drops cached
//! pipelines when a material reports a change.

use std::sync::Arc;

use lilium_core::signal::Signal;
use parking_lot::RwLock;

use crate::types::MaterialId;

/// How a material's output is combined with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Writes depth, sorted front to back and batched by pipeline.
    #[default]
    Opaque,
    /// Alpha blended, sorted back to front after all opaque draws.
    Transparent,
}

/// Descriptor for creating a material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Name of the shader the material is compiled from.
    pub shader: String,
    pub blend_mode: BlendMode,
    /// Whether opaque draws of this material go through the depth prepass.
    pub depth_prepass: bool,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            shader: "lit".to_string(),
            blend_mode: BlendMode::Opaque,
            depth_prepass: true,
        }
    }
}

impl MaterialDescriptor {
    /// Create a new material descriptor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shader name.
    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.shader = shader.into();
        self
    }

    /// Set the blend mode.
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Opt in or out of the depth prepass.
    pub fn with_depth_prepass(mut self, enabled: bool) -> Self {
        self.depth_prepass = enabled;
        self
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Notifications emitted by a [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialEvent {
    /// Shader or blend state changed; cached pipelines are stale.
    PipelineChanged,
    /// The material is being dropped.
    Released,
}

/// A shader plus fixed-function state, shared between renderables.
pub struct Material {
    id: MaterialId,
    descriptor: RwLock<MaterialDescriptor>,
    events: Signal<MaterialEvent>,
}

impl Material {
    pub fn new(descriptor: MaterialDescriptor) -> Arc<Self> {
        Arc::new(Self {
            id: MaterialId::next(),
            descriptor: RwLock::new(descriptor),
            events: Signal::new(),
        })
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Snapshot of the current descriptor.
    pub fn descriptor(&self) -> MaterialDescriptor {
        self.descriptor.read().clone()
    }

    pub fn label(&self) -> String {
        self.descriptor
            .read()
            .label
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn shader(&self) -> String {
        self.descriptor.read().shader.clone()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.descriptor.read().blend_mode
    }

    pub fn is_transparent(&self) -> bool {
        self.blend_mode() == BlendMode::Transparent
    }

    /// True if opaque draws of this material should be rendered in the depth
    /// prepass. Transparent materials never are.
    pub fn wants_depth_prepass(&self) -> bool {
        let descriptor = self.descriptor.read();
        descriptor.depth_prepass && descriptor.blend_mode == BlendMode::Opaque
    }

    /// Switch to another shader.
    pub fn set_shader(&self, shader: impl Into<String>) {
        self.descriptor.write().shader = shader.into();
        self.events.emit(&MaterialEvent::PipelineChanged);
    }

    pub fn set_blend_mode(&self, blend_mode: BlendMode) {
        self.descriptor.write().blend_mode = blend_mode;
        self.events.emit(&MaterialEvent::PipelineChanged);
    }

    /// Report that the shader source changed in place, e.g. on hot reload.
    pub fn notify_pipeline_changed(&self) {
        self.events.emit(&MaterialEvent::PipelineChanged);
    }

    pub fn events(&self) -> &Signal<MaterialEvent> {
        &self.events
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        self.events.emit(&MaterialEvent::Released);
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id)
            .field("descriptor", &*self.descriptor.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(Material: Send, Sync);
