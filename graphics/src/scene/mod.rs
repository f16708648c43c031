//! Scene objects the pipeline renders but does not own.
//!
//! - [`WorldInstance`] - A placed object: world transform plus per-instance data
//! - [`InstancedRenderable`] - Geometry and materials attached to an instance
//! - [`AbstractViewer`] - Anything that looks at the scene and renders into a
//!   [`RenderTarget`](crate::types::RenderTarget); [`Camera`] is the standard one
//!
//! # Ownership
//!
//! The application holds `Arc`s to all of these. The
//! [`FramePipeline`](crate::pipeline::FramePipeline) keeps weak references
//! and learns about changes through the objects' signals, so dropping an
//! object is always safe and removes it from rendering.

mod instance;
mod renderable;
mod viewer;

pub use instance::{InstanceUniforms, WorldInstance};
pub use renderable::{
    CustomRenderable, InstancedRenderable, ProducedElement, RenderableEvent, RenderableKind,
    Submesh,
};
pub use viewer::{AbstractViewer, Camera, ViewerId};
