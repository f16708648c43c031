//! GPU resources referenced by the pipeline.
//!
//! - [`Buffer`] / [`BufferSlice`]: application-owned geometry, referenced
//!   weakly so a dropped buffer is detected instead of drawn
//! - [`UploadPool`]: per-frame linear allocator for per-draw data
//! - [`RendererResources`]: geometry shared by every sprite and billboard

mod buffer;
mod shared;
mod upload_pool;

pub use buffer::{Buffer, BufferSlice};
pub use shared::{QUAD_INDEX_COUNT, QUAD_INDICES, QUAD_VERTICES, RendererResources};
pub use upload_pool::{UploadAllocation, UploadPool};
