//! GPU buffer handles.

use std::ops::Range;
use std::sync::{Arc, Weak};

use crate::error::PipelineError;
use crate::types::{BufferDescriptor, BufferId};

/// A GPU buffer resource.
///
/// Buffers are owned by the application through an `Arc`. Renderables only
/// keep [`BufferSlice`]s, which hold a weak reference.
///
/// # Example
///
/// ```ignore
/// let buffer = Buffer::new(BufferDescriptor::new(1024, BufferUsage::VERTEX));
/// let slice = buffer.slice(0..512);
/// assert!(slice.is_alive());
/// ```
pub struct Buffer {
    id: BufferId,
    descriptor: BufferDescriptor,
}

impl Buffer {
    pub fn new(descriptor: BufferDescriptor) -> Arc<Self> {
        Arc::new(Self {
            id: BufferId::next(),
            descriptor,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Weak view of a byte range of this buffer.
    ///
    /// The range is clamped to the buffer size.
    pub fn slice(self: &Arc<Self>, range: Range<u64>) -> BufferSlice {
        let end = range.end.min(self.size());
        let start = range.start.min(end);
        BufferSlice {
            buffer: Arc::downgrade(self),
            id: self.id,
            label: self.label().unwrap_or("unnamed buffer").to_string(),
            range: start..end,
        }
    }

    /// Weak view of the whole buffer.
    pub fn whole(self: &Arc<Self>) -> BufferSlice {
        self.slice(0..self.size())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

/// A byte range of a [`Buffer`] that does not keep the buffer alive.
#[derive(Clone)]
pub struct BufferSlice {
    buffer: Weak<Buffer>,
    id: BufferId,
    label: String,
    range: Range<u64>,
}

impl BufferSlice {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }

    pub fn size(&self) -> u64 {
        self.range.end - self.range.start
    }

    pub fn is_alive(&self) -> bool {
        self.buffer.strong_count() > 0
    }

    /// Access the buffer, failing with [`PipelineError::StaleResource`] if it
    /// was dropped.
    pub fn upgrade(&self) -> Result<Arc<Buffer>, PipelineError> {
        self.buffer
            .upgrade()
            .ok_or_else(|| PipelineError::StaleResource {
                label: self.label.clone(),
            })
    }
}

impl std::fmt::Debug for BufferSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSlice")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("range", &self.range)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    fn vertex_buffer() -> Arc<Buffer> {
        Buffer::new(BufferDescriptor::new(256, BufferUsage::VERTEX).with_label("verts"))
    }

    #[test]
    fn slice_is_clamped() {
        let buffer = vertex_buffer();
        let slice = buffer.slice(128..1024);
        assert_eq!(slice.range(), 128..256);
        assert_eq!(slice.size(), 128);
        assert_eq!(slice.id(), buffer.id());
    }

    #[test]
    fn slice_does_not_keep_buffer_alive() {
        let buffer = vertex_buffer();
        let slice = buffer.whole();
        assert!(slice.upgrade().is_ok());

        drop(buffer);
        assert!(!slice.is_alive());
        assert_eq!(
            slice.upgrade().unwrap_err(),
            PipelineError::StaleResource {
                label: "verts".to_string()
            }
        );
    }
}
