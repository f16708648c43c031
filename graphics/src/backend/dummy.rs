//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but hands out valid
//! texture handles, so the whole pipeline can run without GPU hardware.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::{AttachmentDescriptor, TextureFormat};

use super::{BackendError, GpuBackend, GpuTexture};

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    unsupported_formats: Vec<TextureFormat>,
    attachment_limit: Option<usize>,
    attachments_created: AtomicUsize,
}

impl DummyBackend {
    /// Create a new dummy backend that accepts every format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject attachments of the given format.
    pub fn with_unsupported_format(mut self, format: TextureFormat) -> Self {
        self.unsupported_formats.push(format);
        self
    }

    /// Fail attachment creation once `limit` textures exist.
    pub fn with_attachment_limit(mut self, limit: usize) -> Self {
        self.attachment_limit = Some(limit);
        self
    }

    /// Number of attachment textures created so far.
    pub fn attachments_created(&self) -> usize {
        self.attachments_created.load(Ordering::Relaxed)
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &str {
        "Dummy Backend"
    }

    fn supports_attachment_format(&self, format: TextureFormat) -> bool {
        !self.unsupported_formats.contains(&format)
    }

    fn create_attachment(
        &self,
        label: &str,
        descriptor: &AttachmentDescriptor,
    ) -> Result<GpuTexture, BackendError> {
        if !self.supports_attachment_format(descriptor.format) {
            return Err(BackendError::UnsupportedFormat(descriptor.format));
        }
        if let Some(limit) = self.attachment_limit
            && self.attachments_created() >= limit
        {
            return Err(BackendError::AttachmentCreationFailed(format!(
                "{label}: device limit of {limit} textures reached"
            )));
        }
        log::trace!(
            "DummyBackend: creating attachment {label} ({}x{} {:?})",
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        self.attachments_created.fetch_add(1, Ordering::Relaxed);
        Ok(GpuTexture::new(*descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extent2d;

    #[test]
    fn creates_attachments() {
        let backend = DummyBackend::new();
        let desc = AttachmentDescriptor::depth(TextureFormat::Depth32Float, Extent2d::new(8, 8));
        let a = backend.create_attachment("depth", &desc).unwrap();
        let b = backend.create_attachment("depth", &desc).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.descriptor(), &desc);
        assert_eq!(backend.attachments_created(), 2);
    }

    #[test]
    fn rejects_unsupported_format() {
        let backend = DummyBackend::new().with_unsupported_format(TextureFormat::Rgba32Float);
        assert!(!backend.supports_attachment_format(TextureFormat::Rgba32Float));
        let desc = AttachmentDescriptor::color(TextureFormat::Rgba32Float, Extent2d::new(8, 8));
        assert_eq!(
            backend.create_attachment("color", &desc),
            Err(BackendError::UnsupportedFormat(TextureFormat::Rgba32Float))
        );
    }

    #[test]
    fn enforces_attachment_limit() {
        let backend = DummyBackend::new().with_attachment_limit(1);
        let desc = AttachmentDescriptor::color(TextureFormat::Rgba8Unorm, Extent2d::new(8, 8));
        assert!(backend.create_attachment("a", &desc).is_ok());
        assert!(matches!(
            backend.create_attachment("b", &desc),
            Err(BackendError::AttachmentCreationFailed(_))
        ));
    }
}
