//! Common types and descriptors shared across the frame pipeline.
//!
//! This module contains format enums, usage flags, identifiers and the
//! render target description viewers draw into.

mod buffer;
mod common;
mod ids;
mod target;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{ClearValue, Extent2d, LoadOp, Viewport};
pub use ids::{BufferId, InstanceId, MaterialId, RenderTargetId, RenderableId, TextureId};
pub use target::{RenderTarget, RenderTargetKind};
pub use texture::{AttachmentDescriptor, TextureFormat, TextureUsage};
