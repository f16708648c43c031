//! Render queues.
//!
//! Each viewer owns one queue per pass. A queue is filled when the viewer is
//! rebuilt, sorted once, and then replayed every frame until the next
//! rebuild. A [`RenderQueueRegistry`] groups the sorted entries into batches
//! of identical (pipeline, material) so state changes happen once per batch.

mod registry;
mod render_queue;
mod sort_key;

pub use registry::{RenderBatch, RenderQueueRegistry};
pub use render_queue::{QueueEntry, RenderQueue};
pub use sort_key::{BlendClass, SortKey, TransparencySort, depth_prepass_order, forward_order};
