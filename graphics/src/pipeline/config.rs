//! Frame pipeline configuration.

use crate::queue::TransparencySort;
use crate::resources::UploadPool;
use crate::types::TextureFormat;

/// Settings fixed for the lifetime of a [`FramePipeline`](super::FramePipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct FramePipelineConfig {
    /// Add depth pre-pass nodes for viewers with early-z elements.
    pub depth_prepass: bool,
    /// Format of every viewer's depth attachment.
    pub depth_format: TextureFormat,
    /// Format surface viewers render into before the present blit.
    pub intermediate_color_format: TextureFormat,
    pub transparency_sort: TransparencySort,
    /// Bytes of per-draw data one frame may upload.
    pub upload_pool_capacity: u64,
    pub upload_alignment: u64,
    /// Upper bound on attachment textures the pipeline may own.
    pub max_attachments: usize,
}

impl Default for FramePipelineConfig {
    fn default() -> Self {
        Self {
            depth_prepass: true,
            depth_format: TextureFormat::Depth32Float,
            intermediate_color_format: TextureFormat::Rgba16Float,
            transparency_sort: TransparencySort::BackToFront,
            upload_pool_capacity: 1 << 20,
            upload_alignment: UploadPool::DEFAULT_ALIGNMENT,
            max_attachments: 64,
        }
    }
}

impl FramePipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth_prepass(mut self, enabled: bool) -> Self {
        self.depth_prepass = enabled;
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = format;
        self
    }

    pub fn with_intermediate_color_format(mut self, format: TextureFormat) -> Self {
        self.intermediate_color_format = format;
        self
    }

    pub fn with_transparency_sort(mut self, sort: TransparencySort) -> Self {
        self.transparency_sort = sort;
        self
    }

    pub fn with_upload_pool(mut self, capacity: u64, alignment: u64) -> Self {
        self.upload_pool_capacity = capacity;
        self.upload_alignment = alignment;
        self
    }

    pub fn with_max_attachments(mut self, max_attachments: usize) -> Self {
        self.max_attachments = max_attachments;
        self
    }
}
