//! Per-frame input and output of [`FramePipeline::render`](super::FramePipeline::render).

use std::time::Duration;

use crate::backend::CommandEncoder;

/// What the caller hands to one `render` call.
pub struct FrameContext<'a> {
    encoder: &'a mut dyn CommandEncoder,
    frame_index: u64,
    delta_time: Duration,
}

impl<'a> FrameContext<'a> {
    pub fn new(encoder: &'a mut dyn CommandEncoder) -> Self {
        Self {
            encoder,
            frame_index: 0,
            delta_time: Duration::ZERO,
        }
    }

    /// Attach the application's frame counter and frame time.
    pub fn with_timing(mut self, frame_index: u64, delta_time: Duration) -> Self {
        self.frame_index = frame_index;
        self.delta_time = delta_time;
        self
    }

    pub fn encoder(&mut self) -> &mut dyn CommandEncoder {
        &mut *self.encoder
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }
}

impl std::fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameContext")
            .field("frame_index", &self.frame_index)
            .field("delta_time", &self.delta_time)
            .finish()
    }
}

/// What one `render` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Viewers whose queues were rebuilt this frame.
    pub rebuilt_viewers: usize,
    /// Whether the frame graph was baked this frame.
    pub rebaked: bool,
    /// A bake failed and the previous graph was replayed instead.
    pub used_previous_graph: bool,
    pub passes_executed: usize,
    pub draw_calls: usize,
    /// Elements skipped because a resource they reference was released.
    pub stale_elements: usize,
    /// Elements dropped because no pipeline could be resolved for them.
    pub dropped_elements: usize,
    /// Elements skipped because the upload pool ran out of space.
    pub overflowed_elements: usize,
    /// Elements whose recording failed for another reason.
    pub failed_elements: usize,
}
