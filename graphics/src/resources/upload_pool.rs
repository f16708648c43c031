//! Per-frame upload pool.
//!
//! Per-draw data (model matrices, tints) is only valid for the frame it was
//! written in. The pool is a linear allocator over one uniform buffer: each
//! draw pushes its block, and the pipeline resets the pool at the start of
//! the next frame, so nothing written during frame N is visible in frame N+1.
//!
//! ```ignore
//! pool.reset();
//! let block = pool.push(&uniforms).ok_or(...)?;
//! encoder.bind_uniform_block(block);
//! ```

use std::sync::Arc;

use bytemuck::Pod;

use crate::backend::BackendError;
use crate::resources::Buffer;
use crate::types::{BufferDescriptor, BufferUsage};

/// A region written into the upload pool during the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadAllocation {
    /// Byte offset into the pool buffer.
    pub offset: u64,
    /// Size of the allocation in bytes.
    pub size: u64,
    /// Frame the allocation belongs to.
    pub frame: u64,
}

impl UploadAllocation {
    /// Get the end offset (offset + size).
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Linear allocator for per-frame GPU data.
///
/// `UploadPool` is not thread-safe; it is owned by the pipeline and only
/// touched while recording.
pub struct UploadPool {
    buffer: Arc<Buffer>,
    staging: Vec<u8>,
    write_offset: u64,
    alignment: u64,
    frame: u64,
}

impl UploadPool {
    /// Default alignment for allocations (256 bytes).
    ///
    /// This matches the typical minimum uniform buffer offset alignment.
    pub const DEFAULT_ALIGNMENT: u64 = 256;

    pub fn new(capacity: u64) -> Result<Self, BackendError> {
        Self::with_alignment(capacity, Self::DEFAULT_ALIGNMENT)
    }

    /// Create a pool with custom alignment (must be a power of 2).
    pub fn with_alignment(capacity: u64, alignment: u64) -> Result<Self, BackendError> {
        if !alignment.is_power_of_two() {
            return Err(BackendError::Internal(format!(
                "alignment must be a power of 2, got {alignment}"
            )));
        }
        if capacity == 0 {
            return Err(BackendError::Internal(
                "upload pool capacity cannot be zero".to_string(),
            ));
        }

        let capacity = align_up(capacity, alignment);
        let descriptor = BufferDescriptor::new(capacity, BufferUsage::UNIFORM | BufferUsage::COPY_DST)
            .with_label("frame_upload_pool");

        Ok(Self {
            buffer: Buffer::new(descriptor),
            staging: vec![0; capacity as usize],
            write_offset: 0,
            alignment,
            frame: 0,
        })
    }

    /// The GPU buffer backing the pool.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.staging.len() as u64
    }

    pub fn used(&self) -> u64 {
        self.write_offset
    }

    pub fn remaining(&self) -> u64 {
        self.capacity() - self.write_offset
    }

    /// Index of the frame currently being written.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Reserve `size` bytes. Returns `None` when the pool is full.
    pub fn allocate(&mut self, size: u64) -> Option<UploadAllocation> {
        let offset = align_up(self.write_offset, self.alignment);
        if offset + size > self.capacity() {
            return None;
        }
        self.write_offset = offset + size;
        Some(UploadAllocation {
            offset,
            size,
            frame: self.frame,
        })
    }

    /// Copy a plain-old-data value into a fresh allocation.
    pub fn push<T: Pod>(&mut self, value: &T) -> Option<UploadAllocation> {
        let bytes = bytemuck::bytes_of(value);
        let allocation = self.allocate(bytes.len() as u64)?;
        self.staging[allocation.offset as usize..allocation.end() as usize].copy_from_slice(bytes);
        Some(allocation)
    }

    /// Bytes written for an allocation of the current frame.
    ///
    /// Returns `None` for allocations from an earlier frame.
    pub fn data(&self, allocation: &UploadAllocation) -> Option<&[u8]> {
        if allocation.frame != self.frame || allocation.end() > self.write_offset {
            return None;
        }
        Some(&self.staging[allocation.offset as usize..allocation.end() as usize])
    }

    /// Everything written this frame, ready to copy into [`buffer`](Self::buffer).
    pub fn staged_bytes(&self) -> &[u8] {
        &self.staging[..self.write_offset as usize]
    }

    /// Start a new frame, discarding all allocations.
    pub fn reset(&mut self) {
        self.write_offset = 0;
        self.frame += 1;
    }
}

impl std::fmt::Debug for UploadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPool")
            .field("capacity", &self.capacity())
            .field("write_offset", &self.write_offset)
            .field("alignment", &self.alignment)
            .field("frame", &self.frame)
            .finish()
    }
}

/// Align a value up to the given alignment.
#[inline]
fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}
