//! # Lilium Graphics
//!
//! Frame pipeline for Lilium: decides what to draw, for which viewer, in
//! which order, and records it into a backend command encoder.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`FramePipeline`] - Registration, invalidation and per-frame rendering
//! - [`scene`] - World instances, renderables and viewers the application owns
//! - [`queue`] - Sorted per-viewer render queues and their batches
//! - [`graph`] - Frame graph compilation, baking and attachment aliasing
//! - [`backend`] - The two traits a GPU backend implements, plus a dummy one
//!   for tests
//!
//! ## Example
//!
//! ```ignore
//! use lilium_graphics::{FrameContext, FramePipeline, FramePipelineConfig};
//!
//! let mut pipeline = FramePipeline::new(backend, ShaderLibrary::standard(), FramePipelineConfig::default())?;
//! pipeline.register_viewer(&camera)?;
//! pipeline.register_instanced_drawable(&instance, &renderable);
//!
//! let report = pipeline.render(&mut FrameContext::new(&mut encoder))?;
//! ```

pub mod backend;
pub mod element;
pub mod error;
pub mod graph;
pub mod materials;
pub mod pipeline;
pub mod queue;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use backend::{
    AttachmentBinding, AttachmentSlot, BackendError, CommandEncoder, DummyBackend, GpuBackend,
    RecordedCommand, RecordingEncoder,
};
pub use element::{ElementRenderer, RenderElement, RenderElementKind};
pub use error::PipelineError;
pub use graph::{BakedFrameGraph, FrameGraph};
pub use materials::{BlendMode, Material, MaterialDescriptor, PassType, PipelineHandle};
pub use pipeline::{
    FrameContext, FramePipeline, FramePipelineConfig, FrameReport, InvalidationHandle,
    RegistrationState,
};
pub use queue::TransparencySort;
pub use resources::Buffer;
pub use scene::{AbstractViewer, Camera, InstancedRenderable, RenderableKind, ViewerId, WorldInstance};
pub use shader::{ShaderLibrary, ShaderResolver};
pub use types::{
    BufferDescriptor, BufferUsage, ClearValue, Extent2d, LoadOp, RenderTarget, TextureFormat,
    Viewport,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Only logs the version; kept so applications have one place to hook
/// process-wide setup.
pub fn init() {
    log::info!("Lilium Graphics v{} initialized", VERSION);
}
