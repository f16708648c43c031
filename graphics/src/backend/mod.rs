//! GPU backend abstraction layer.
//!
//! The frame pipeline never talks to a graphics API directly. It needs two
//! things from a backend:
//!
//! - a [`GpuBackend`] device that creates attachment textures and reports
//!   which formats it can render to
//! - a [`CommandEncoder`] that records the commands of one frame
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: creates placeholder textures, for tests and headless
//!   runs
//! - [`RecordingEncoder`]: captures every recorded command for inspection

mod dummy;
mod encoder;
mod error;

pub use dummy::DummyBackend;
pub use encoder::{CommandEncoder, RecordedCommand, RecordingEncoder};
pub use error::BackendError;

use crate::types::{AttachmentDescriptor, RenderTargetId, TextureFormat, TextureId};

/// Handle to a backend texture used as a frame-graph attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GpuTexture {
    id: TextureId,
    descriptor: AttachmentDescriptor,
}

impl GpuTexture {
    pub fn new(descriptor: AttachmentDescriptor) -> Self {
        Self {
            id: TextureId::next(),
            descriptor,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn descriptor(&self) -> &AttachmentDescriptor {
        &self.descriptor
    }
}

/// The physical resource behind a frame-graph attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentBinding {
    /// A texture owned by the pipeline's attachment pool.
    Texture(GpuTexture),
    /// A presentable surface owned by the windowing layer.
    Surface(RenderTargetId),
}

/// Where an attachment is bound within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    /// Color output at the given index.
    Color(u32),
    /// Depth/stencil output.
    Depth,
    /// Read-only input, sampled or blitted from.
    Source(u32),
}

/// A GPU device, as seen by the frame pipeline.
pub trait GpuBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Whether the device can render into textures of this format.
    fn supports_attachment_format(&self, format: TextureFormat) -> bool;

    /// Create a texture for use as a frame-graph attachment.
    fn create_attachment(
        &self,
        label: &str,
        descriptor: &AttachmentDescriptor,
    ) -> Result<GpuTexture, BackendError>;
}

static_assertions::assert_impl_all!(GpuTexture: Send, Sync);
static_assertions::assert_impl_all!(AttachmentBinding: Send, Sync);
