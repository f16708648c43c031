//! Render targets that viewers draw into.

use super::{Extent2d, RenderTargetId, TextureFormat};

/// Where a render target's pixels end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetKind {
    /// A presentable surface owned by the windowing layer.
    Surface,
    /// An offscreen texture owned by the pipeline, which other viewers may
    /// sample.
    Texture,
}

/// Description of a viewer's output.
///
/// Identity is carried by [`id`](Self::id): two targets with the same id
/// refer to the same pixels even if their size changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    id: RenderTargetId,
    kind: RenderTargetKind,
    format: TextureFormat,
    size: Extent2d,
}

impl RenderTarget {
    /// Describe a presentable surface.
    pub fn surface(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            id: RenderTargetId::next(),
            kind: RenderTargetKind::Surface,
            format,
            size: Extent2d::new(width, height),
        }
    }

    /// Describe an offscreen texture target.
    pub fn texture(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            id: RenderTargetId::next(),
            kind: RenderTargetKind::Texture,
            format,
            size: Extent2d::new(width, height),
        }
    }

    /// Same target with a new size, e.g. after a window resize.
    pub fn resized(mut self, width: u32, height: u32) -> Self {
        self.size = Extent2d::new(width, height);
        self
    }

    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    pub fn kind(&self) -> RenderTargetKind {
        self.kind
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn size(&self) -> Extent2d {
        self.size
    }

    pub fn is_surface(&self) -> bool {
        self.kind == RenderTargetKind::Surface
    }
}
