//! Command recording.

use std::ops::Range;

use crate::materials::PipelineHandle;
use crate::resources::UploadAllocation;
use crate::types::{BufferId, LoadOp, Viewport};

use super::{AttachmentBinding, AttachmentSlot};

/// Records the GPU commands of one frame.
///
/// The pipeline drives the encoder strictly in frame-graph order; a backend
/// can translate each call to its native command buffer.
pub trait CommandEncoder {
    fn begin_pass(&mut self, label: &str);
    fn end_pass(&mut self);
    fn bind_attachment(&mut self, slot: AttachmentSlot, binding: &AttachmentBinding, load: LoadOp);
    fn set_viewport(&mut self, viewport: &Viewport);
    fn bind_pipeline(&mut self, pipeline: PipelineHandle);
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: BufferId, range: Range<u64>);
    fn bind_index_buffer(&mut self, buffer: BufferId, range: Range<u64>);
    /// Bind a block of per-draw data written into the frame's upload pool.
    fn bind_uniform_block(&mut self, allocation: UploadAllocation);
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>);
    /// Copy a whole attachment into another one of the same size.
    fn blit(&mut self, source: &AttachmentBinding, destination: &AttachmentBinding);
}

/// A command captured by [`RecordingEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginPass(String),
    EndPass,
    BindAttachment {
        slot: AttachmentSlot,
        binding: AttachmentBinding,
        load: LoadOp,
    },
    SetViewport(Viewport),
    BindPipeline(PipelineHandle),
    BindVertexBuffer {
        slot: u32,
        buffer: BufferId,
        range: Range<u64>,
    },
    BindIndexBuffer {
        buffer: BufferId,
        range: Range<u64>,
    },
    BindUniformBlock(UploadAllocation),
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        instances: Range<u32>,
    },
    Blit {
        source: AttachmentBinding,
        destination: AttachmentBinding,
    },
}

impl RecordedCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw { .. } | Self::DrawIndexed { .. })
    }
}

/// Encoder that keeps every command in memory.
///
/// Used by tests and by tooling that wants to inspect a frame.
#[derive(Debug, Default)]
pub struct RecordingEncoder {
    commands: Vec<RecordedCommand>,
}

impl RecordingEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Forget the recorded commands, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Labels of all passes, in recording order.
    pub fn pass_labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::BeginPass(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded between `BeginPass(label)` and its `EndPass`.
    pub fn pass_commands(&self, label: &str) -> &[RecordedCommand] {
        let Some(start) = self
            .commands
            .iter()
            .position(|c| matches!(c, RecordedCommand::BeginPass(l) if l == label))
        else {
            return &[];
        };
        let end = self.commands[start..]
            .iter()
            .position(|c| matches!(c, RecordedCommand::EndPass))
            .map_or(self.commands.len(), |offset| start + offset);
        &self.commands[start + 1..end]
    }

    /// Pipelines bound in the given pass, in order.
    pub fn bound_pipelines(&self, label: &str) -> Vec<PipelineHandle> {
        self.pass_commands(label)
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::BindPipeline(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: RecordedCommand) {
        log::trace!("RecordingEncoder: {command:?}");
        self.commands.push(command);
    }
}

impl CommandEncoder for RecordingEncoder {
    fn begin_pass(&mut self, label: &str) {
        self.push(RecordedCommand::BeginPass(label.to_string()));
    }

    fn end_pass(&mut self) {
        self.push(RecordedCommand::EndPass);
    }

    fn bind_attachment(&mut self, slot: AttachmentSlot, binding: &AttachmentBinding, load: LoadOp) {
        self.push(RecordedCommand::BindAttachment {
            slot,
            binding: binding.clone(),
            load,
        });
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.push(RecordedCommand::SetViewport(*viewport));
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        self.push(RecordedCommand::BindPipeline(pipeline));
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: BufferId, range: Range<u64>) {
        self.push(RecordedCommand::BindVertexBuffer {
            slot,
            buffer,
            range,
        });
    }

    fn bind_index_buffer(&mut self, buffer: BufferId, range: Range<u64>) {
        self.push(RecordedCommand::BindIndexBuffer { buffer, range });
    }

    fn bind_uniform_block(&mut self, allocation: UploadAllocation) {
        self.push(RecordedCommand::BindUniformBlock(allocation));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.push(RecordedCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        self.push(RecordedCommand::DrawIndexed { indices, instances });
    }

    fn blit(&mut self, source: &AttachmentBinding, destination: &AttachmentBinding) {
        self.push(RecordedCommand::Blit {
            source: source.clone(),
            destination: destination.clone(),
        });
    }
}
